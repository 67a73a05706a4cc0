pub(crate) mod backend;
pub(crate) mod blur;
pub(crate) mod compile;
pub(crate) mod composite;
pub(crate) mod cpu;
