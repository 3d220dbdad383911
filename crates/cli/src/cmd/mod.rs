mod bundle;
mod info;
mod layer;
mod plan;

pub use bundle::{BundleArgs, cmd_bundle};
pub use info::cmd_info;
pub use layer::{LayerArgs, cmd_layer};
pub use plan::{PlanArgs, cmd_plan};
