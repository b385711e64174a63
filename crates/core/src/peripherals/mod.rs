pub mod uart;

pub use uart::{Access, FifoModel, SimPl011};
