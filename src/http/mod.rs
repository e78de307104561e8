// HTTP transport for the board server

pub mod client;


pub use client::HttpWorkflowApi;
