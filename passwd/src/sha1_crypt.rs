//! PBKDF1 with HMAC-SHA-1, the NetBSD `$sha1$` scheme.

use ring::hmac;

use crate::encoding;

/// Hashes a password with iterated HMAC-SHA-1 keyed by the password,
/// returning the full `$sha1$<iterations>$<salt>$<digest>` string.
pub(crate) fn crypt(password: &[u8], salt: &[u8], iterations: u64) -> Vec<u8> {
	let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, password);

	// The first block covers the salt, the magic and the iteration count.
	let mut data = salt.to_vec();
	data.extend_from_slice(b"$sha1$");
	data.extend_from_slice(iterations.to_string().as_bytes());
	let mut tag = hmac::sign(&key, &data);

	// Every remaining iteration feeds the previous tag back through the
	// HMAC.
	for _ in 1..iterations {
		tag = hmac::sign(&key, tag.as_ref());
	}

	let mut hash = format!("$sha1${}$", iterations).into_bytes();
	hash.extend_from_slice(salt);
	hash.push(b'$');
	hash.extend(encoding::b64_encode(tag.as_ref()));
	hash
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_known_hash() {
		assert_eq!(
			crypt(b"Test", b"NabW/sfk3ZVVQc4BnZ/3", 245081),
			b"$sha1$245081$NabW/sfk3ZVVQc4BnZ/3$YoV1Iva6GK4tkxwahBmyH0TRCwBO".to_vec()
		);
	}

	#[test]
	fn test_digest_width() {
		// 20 HMAC bytes always encode to 28 characters.
		let hash = crypt(b"Test", b"salt", 2);
		assert_eq!(hash.len(), b"$sha1$2$salt$".len() + 28);
	}
}
