pub mod acceleration;
pub mod instance;
pub mod node;
pub mod output;
pub mod scale_correction;
pub mod stack;
pub mod transform;
pub mod tree;
