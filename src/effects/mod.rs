pub(crate) mod particle;
pub(crate) mod ring;
pub(crate) mod simulator;
