//! The NT LAN Manager `$3$` scheme.

use md4::{Digest, Md4};

/// Hashes a password as an NT hash: MD4 over the UCS-2LE encoding of the
/// password, rendered as 32 lowercase hex characters. NT hashes carry no
/// salt.
pub(crate) fn crypt(password: &[u8]) -> Vec<u8> {
	// Invalid UTF-8 sequences become replacement characters on the way to
	// UCS-2, the same treatment a lossy decoder gives them.
	let ucs2: Vec<u8> = String::from_utf8_lossy(password)
		.encode_utf16()
		.flat_map(u16::to_le_bytes)
		.collect();
	let digest = Md4::digest(&ucs2);
	format!("$3$${}", hex::encode(digest)).into_bytes()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_known_hash() {
		assert_eq!(crypt(b"Test"), b"$3$$4a1fab8f6b5441e0493dc7d41304bfb6");
	}

	#[test]
	fn test_empty_password() {
		// The well known NT hash of the empty password.
		assert_eq!(crypt(b""), b"$3$$31d6cfe0d16ae931b73c59d7e0c089c0");
	}
}
