/// Errors of message (de)serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The message type does not belong to any supported subprotocol.
    UnexpectedMessage(u8),
    /// The message does not fit in a single Sv2 frame.
    BadPayloadSize,
    BinaryError(binary_sv2::Error),
}

impl From<binary_sv2::Error> for ParserError {
    fn from(e: binary_sv2::Error) -> Self {
        ParserError::BinaryError(e)
    }
}

impl core::fmt::Display for ParserError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParserError::UnexpectedMessage(msg_type) => {
                write!(f, "No supported message has type {msg_type:#04x}")
            }
            ParserError::BadPayloadSize => write!(f, "Message too large for a frame"),
            ParserError::BinaryError(e) => write!(f, "Failed to decode message: {e}"),
        }
    }
}
