pub mod face;
pub mod power;
pub mod sensor;
