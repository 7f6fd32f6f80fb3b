mod inflate;
pub mod numeric;

pub use inflate::{inflate, InflateError};
pub use numeric::{bytes_to_decimal, decimal_to_bytes, NumericError};

/*
 * Payload codecs
 *
 * - Decimal digit strings <-> big-endian bytes (Secure QR transport form)
 * - zlib / gzip inflation of the signed record
 */
