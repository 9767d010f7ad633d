//! The scrypt `$7$` scheme.

use crate::encoding;
use crate::kdf;
use crate::PasswdError;

/// Hashes a password with scrypt, returning the full
/// `$7$<params><salt>$<digest>` string. The 11 character parameter block
/// packs N's exponent followed by r and p as 30 bit little endian values.
pub(crate) fn crypt(password: &[u8], params: &str, salt: &[u8]) -> Result<Vec<u8>, PasswdError> {
	let (n_log2, r, p) = decode_params(params)?;

	// The salt text itself keys the KDF, not a decoding of it.
	let dk = kdf::scrypt_key(password, salt, n_log2, r, p, 32)?;

	let mut hash = format!("$7${}", params).into_bytes();
	hash.extend_from_slice(salt);
	hash.push(b'$');
	hash.extend(encoding::scrypt_b64_encode(&dk));
	Ok(hash)
}

fn decode_params(params: &str) -> Result<(u8, u32, u32), PasswdError> {
	let bytes = params.as_bytes();
	if bytes.len() != 11 {
		return Err(PasswdError::Malformed(format!("invalid scrypt parameter block: {}", params)));
	}
	let n_log2 = encoding::atoi64(bytes[0]);
	if n_log2 > 63 {
		return Err(PasswdError::Malformed(format!("invalid scrypt parameter block: {}", params)));
	}
	let (Some(r), Some(p)) = (
		encoding::b64_uint32_decode(&bytes[1..6], 30),
		encoding::b64_uint32_decode(&bytes[6..11], 30),
	) else {
		return Err(PasswdError::Malformed(format!("invalid scrypt parameter block: {}", params)));
	};
	Ok((n_log2, r, p))
}
