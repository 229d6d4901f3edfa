//! Serial port device manipulation.

use log::{debug, info};
use serialport::{ClearBuffer, SerialPort};

use crate::{
    error::{Error, Result},
    Settings,
};

//==============================================================================
// Public Interface
//==============================================================================

/// Open the serial port described by `settings`, retrying a few times in case
/// the device is still settling (e.g. just plugged in), and leave it with an
/// empty input buffer.
pub(crate) fn open_and_setup_port(settings: &Settings) -> Result<Box<dyn SerialPort>> {
    use retry::{delay, retry_with_index};

    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(3),
        |index| -> std::result::Result<Box<dyn SerialPort>, serialport::Error> {
            debug!("Trying to open {} ({})", settings.path, index);
            serialport::new(&settings.path, settings.baud_rate)
                .data_bits(settings.data_bits)
                .stop_bits(settings.stop_bits)
                .parity(settings.parity)
                .flow_control(settings.flow_control)
                .timeout(settings.timeout)
                .open()
        },
    );

    let channel_error = |source| Error::ChannelOpen {
        path: settings.path.clone(),
        source,
    };

    match result {
        Ok(mut port) => {
            // Whatever the shell printed before we showed up is of no use and
            // would only delay the synchronization.
            port.clear(ClearBuffer::Input).map_err(channel_error)?;

            info!("Connected to {} at {} baud", settings.path, settings.baud_rate);
            debug!("data_bits    : {:#?}", port.data_bits());
            debug!("stop_bits    : {:#?}", port.stop_bits());
            debug!("parity       : {:#?}", port.parity());
            debug!("flow control : {:#?}", port.flow_control());
            debug!("timeout      : {:?}", port.timeout());

            Ok(port)
        }
        Err(err) => match err {
            retry::Error::Operation {
                error,
                total_delay,
                tries,
            } => {
                info!(
                    "Failed to open the port after {:?} and {} tries: {}",
                    total_delay, tries, error,
                );
                Err(channel_error(error))
            }
            retry::Error::Internal(description) => {
                info!("Internal retry error while opening port: {}", description);
                Err(channel_error(serialport::Error::new(
                    serialport::ErrorKind::Unknown,
                    "internal error while retrying to open the port",
                )))
            }
        },
    }
}
