pub mod collapse;
pub mod quadric;

pub use collapse::simplify;
pub use quadric::Quadric;
