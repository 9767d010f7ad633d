//! MD5-crypt, the FreeBSD `$1$` scheme.

use md5::{Digest, Md5};

use crate::encoding;

const SALT_MAX: usize = 8;
const ROUNDS: u32 = 1000;

/// Hashes a password with the MD5-crypt construction, returning the full
/// `$1$<salt>$<digest>` string as bytes.
pub(crate) fn crypt(password: &[u8], salt: &[u8]) -> Vec<u8> {
	let salt = &salt[..salt.len().min(SALT_MAX)];

	// The alternate digest mixes password, salt, password.
	let mut buf = Vec::new();
	buf.extend_from_slice(password);
	buf.extend_from_slice(salt);
	buf.extend_from_slice(password);
	let alternate: [u8; 16] = Md5::digest(&buf).into();

	// The intermediate digest covers password, magic and salt, then bytes
	// of the alternate digest recycled out to the password length.
	let mut buf = Vec::new();
	buf.extend_from_slice(password);
	buf.extend_from_slice(b"$1$");
	buf.extend_from_slice(salt);
	encoding::recycle(&mut buf, &alternate, password.len());

	// For every bit of the password length: a NUL byte for a one, the
	// first password byte for a zero.
	let mut n = password.len();
	while n > 0 {
		if n & 1 != 0 {
			buf.push(0);
		} else {
			buf.push(password[0]);
		}
		n >>= 1;
	}
	let mut result: [u8; 16] = Md5::digest(&buf).into();

	// The rounds interleave the password, the salt and the running digest
	// on a fixed schedule.
	for round in 0..ROUNDS {
		let mut buf = Vec::new();
		if round & 1 != 0 {
			buf.extend_from_slice(password);
		} else {
			buf.extend_from_slice(&result);
		}
		if round % 3 != 0 {
			buf.extend_from_slice(salt);
		}
		if round % 7 != 0 {
			buf.extend_from_slice(password);
		}
		if round & 1 != 0 {
			buf.extend_from_slice(&result);
		} else {
			buf.extend_from_slice(password);
		}
		result = Md5::digest(&buf).into();
	}

	let mut hash = b"$1$".to_vec();
	hash.extend_from_slice(salt);
	hash.push(b'$');
	hash.extend(encoding::md5_b64_encode(&result));
	hash
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_known_hash() {
		assert_eq!(crypt(b"Test", b"wuIXYcHV"), b"$1$wuIXYcHV$1ufSGHoD0EkWPr75i52ST/");
	}

	#[test]
	fn test_salt_is_truncated_to_eight() {
		assert_eq!(crypt(b"Test", b"wuIXYcHVextra"), crypt(b"Test", b"wuIXYcHV"));
	}

	#[test]
	fn test_empty_password() {
		let hash = crypt(b"", b"wuIXYcHV");
		assert!(hash.starts_with(b"$1$wuIXYcHV$"));
		assert_eq!(hash.len(), b"$1$wuIXYcHV$".len() + 22);
	}
}
