pub mod test_agent;
pub mod test_epsilon;
pub mod test_layers;
pub mod test_recording;
