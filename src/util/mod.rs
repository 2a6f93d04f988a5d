pub mod asset_loader;
pub mod cpf;
pub mod flash;
pub mod states;
