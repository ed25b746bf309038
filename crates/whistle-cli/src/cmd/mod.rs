pub mod campaign;
pub mod run;
