pub(crate) mod assets;
pub(crate) mod health;
pub(crate) mod portfolios;
pub(crate) mod stocks;
