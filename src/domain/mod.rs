// Domain 層：值型別與產生器使用的 ports

pub mod model;
pub mod ports;
