//! The yescrypt `$y$` scheme.

use crate::encoding;
use crate::kdf;
use crate::PasswdError;

/// Hashes a password with yescrypt, returning the full
/// `$y$<params>$<salt>$<digest>` string.
pub(crate) fn crypt(password: &[u8], params: &str, salt: &[u8]) -> Result<Vec<u8>, PasswdError> {
	let (n_log2, r) = decode_params(params)?;

	// Unlike scrypt, the salt text is alphabet decoded before it keys the
	// KDF.
	let raw_salt = encoding::scrypt_b64_decode(salt)
		.ok_or_else(|| PasswdError::Malformed("yescrypt salt is not valid crypt base64".to_owned()))?;
	let dk = kdf::yescrypt_key(password, &raw_salt, n_log2, r)?;

	let mut hash = format!("$y${}$", params).into_bytes();
	hash.extend_from_slice(salt);
	hash.push(b'$');
	hash.extend(encoding::scrypt_b64_encode(&dk));
	Ok(hash)
}

/// Splits a `j<N><r>` parameter block into N's exponent and r. Only the
/// `j` flavor, the libxcrypt default flags, is supported.
fn decode_params(params: &str) -> Result<(u8, u32), PasswdError> {
	let bytes = params.as_bytes();
	if bytes.len() != 3 || bytes[0] != b'j' {
		return Err(PasswdError::Malformed(format!("unsupported yescrypt parameters: {}", params)));
	}
	let n_log2 = encoding::atoi64(bytes[1]);
	let r = encoding::atoi64(bytes[2]);
	if n_log2 > 63 || r > 63 {
		return Err(PasswdError::Malformed(format!("unsupported yescrypt parameters: {}", params)));
	}
	Ok((n_log2, r as u32))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_decode_params() {
		assert_eq!(decode_params("j9T").unwrap(), (11, 31));
		assert!(decode_params("x9T").is_err());
		assert!(decode_params("j9").is_err());
		assert!(decode_params("j$T").is_err());
	}

	#[test]
	fn test_known_hash() {
		assert_eq!(
			crypt(b"Test", "j9T", b"G/uoZu1orhwOE/lUtohEa.").unwrap(),
			b"$y$j9T$G/uoZu1orhwOE/lUtohEa.$SMu/wxtyhBLa5xeRLVnznBx5vE0/VxY7rJZlQX27N84".to_vec()
		);
	}

	#[test]
	fn test_rejects_undecodable_salt() {
		assert!(crypt(b"Test", "j9T", b"!!bad salt!!").is_err());
	}
}
