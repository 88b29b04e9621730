//! The fixed-schema record stored at each leaf cell: an id, a username and
//! an email. Mirrors the teacher's row codec (`storage/encoding.rs`), but
//! collapsed to a single compile-time schema instead of a dynamic column
//! list, since this engine only ever stores one shape of row.

use crate::errors::Error;

/// Maximum username length in bytes, not counting the implicit padding.
pub const USERNAME_MAX_LEN: usize = 32;
/// Maximum email length in bytes, not counting the implicit padding.
pub const EMAIL_MAX_LEN: usize = 255;

const ID_SIZE: usize = std::mem::size_of::<u32>();
const USERNAME_SIZE: usize = USERNAME_MAX_LEN;
const EMAIL_SIZE: usize = EMAIL_MAX_LEN;

const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Total on-disk size of a record: 4 + 32 + 255 = 291 bytes.
pub const RECORD_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

/// A single row: a 32-bit key plus two fixed-width string columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Record {
    pub fn new(id: u32, username: impl Into<String>, email: impl Into<String>) -> Result<Self, Error> {
        let username = username.into();
        let email = email.into();
        check_len("username", &username, USERNAME_MAX_LEN)?;
        check_len("email", &email, EMAIL_MAX_LEN)?;
        Ok(Record { id, username, email })
    }

    /// Encodes this record into exactly `RECORD_SIZE` bytes at fixed offsets.
    /// The id is little-endian; strings are zero-padded to their fixed width.
    pub fn encode(&self, dst: &mut [u8]) -> Result<(), Error> {
        debug_assert!(dst.len() >= RECORD_SIZE);
        check_len("username", &self.username, USERNAME_MAX_LEN)?;
        check_len("email", &self.email, EMAIL_MAX_LEN)?;

        dst[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_padded(&mut dst[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE], &self.username);
        write_padded(&mut dst[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE], &self.email);
        Ok(())
    }

    /// Decodes a record from a `RECORD_SIZE`-byte span produced by `encode`.
    pub fn decode(src: &[u8]) -> Self {
        debug_assert!(src.len() >= RECORD_SIZE);
        let id = u32::from_le_bytes(
            src[ID_OFFSET..ID_OFFSET + ID_SIZE]
                .try_into()
                .expect("fixed-size slice"),
        );
        let username = read_padded(&src[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let email = read_padded(&src[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);
        Record { id, username, email }
    }
}

fn check_len(column: &'static str, value: &str, max: usize) -> Result<(), Error> {
    if value.len() > max {
        return Err(Error::StringTooLong {
            column,
            got: value.len(),
            max,
        });
    }
    Ok(())
}

fn write_padded(dst: &mut [u8], value: &str) {
    dst.fill(0);
    dst[..value.len()].copy_from_slice(value.as_bytes());
}

fn read_padded(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_record() {
        let record = Record::new(7, "alice", "alice@example.com").unwrap();
        let mut buf = [0u8; RECORD_SIZE];
        record.encode(&mut buf).unwrap();
        let decoded = Record::decode(&buf);
        assert_eq!(record, decoded);
    }

    #[test]
    fn pads_short_strings_with_zeros() {
        let record = Record::new(1, "a", "b").unwrap();
        let mut buf = [0xffu8; RECORD_SIZE];
        record.encode(&mut buf).unwrap();
        assert_eq!(&buf[USERNAME_OFFSET + 1..USERNAME_OFFSET + USERNAME_SIZE], &[0u8; USERNAME_SIZE - 1][..]);
    }

    #[test]
    fn accepts_exactly_max_length_strings() {
        let username = "a".repeat(USERNAME_MAX_LEN);
        let email = "b".repeat(EMAIL_MAX_LEN);
        assert!(Record::new(1, username, email).is_ok());
    }

    #[test]
    fn rejects_overlong_username() {
        let username = "a".repeat(USERNAME_MAX_LEN + 1);
        let err = Record::new(1, username, "e").unwrap_err();
        assert!(matches!(err, Error::StringTooLong { column: "username", .. }));
    }

    #[test]
    fn rejects_overlong_email() {
        let email = "a".repeat(EMAIL_MAX_LEN + 1);
        let err = Record::new(1, "u", email).unwrap_err();
        assert!(matches!(err, Error::StringTooLong { column: "email", .. }));
    }

    #[test]
    fn record_size_matches_canonical_layout() {
        assert_eq!(RECORD_SIZE, 4 + 32 + 255);
    }
}
