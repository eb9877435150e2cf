//! Integration tests against mock upstream gateways.

mod end_to_end;
mod mock_server;
mod relay;
