
pub(crate) use mock_ports::*;
