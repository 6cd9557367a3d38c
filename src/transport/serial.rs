// MIT License - Copyright (c) 2026 Peter Wright
// RS-232 transport

use std::future::Future;
use std::io;

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::debug;

use super::Connector;

/// Opens the panel's serial port: 8 data bits, no parity, 1 stop bit, no flow control.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Stream = SerialStream;

    fn connect(
        &self,
        device: &str,
        baud: u32,
    ) -> impl Future<Output = io::Result<SerialStream>> + Send {
        let builder = tokio_serial::new(device, baud)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None);
        let device = device.to_string();
        async move {
            debug!("Opening serial port {} at {} baud", device, baud);
            builder.open_native_async().map_err(io::Error::from)
        }
    }
}
