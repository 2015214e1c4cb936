pub mod traits;
pub mod initialization;
pub mod dense;
pub mod conv;

pub use traits::{Layer as LayerTrait, ParamSlot, Parameter, StateDict};
pub use initialization::WeightInit;
pub use dense::DenseLayer;
pub use conv::Conv2dLayer;
