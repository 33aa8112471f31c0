mod config;
mod lifecycle;
mod session_flow;
mod summaries;
