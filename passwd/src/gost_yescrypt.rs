//! GOST R 34.11-2012 wrapped yescrypt, the `$gy$` scheme.

use hmac::{Hmac, Mac};
use streebog::{Digest, Streebog256};

use crate::encoding;
use crate::yescrypt_crypt;
use crate::PasswdError;

type HmacStreebog256 = Hmac<Streebog256>;

/// Hashes a password with yescrypt, then re-keys the digest through
/// HMAC-Streebog-256 bound to the `$gy$` settings.
pub(crate) fn crypt(password: &[u8], params: &str, salt: &[u8]) -> Result<Vec<u8>, PasswdError> {
	// The inner hash runs under the equivalent `$y$` settings.
	let y_hash = yescrypt_crypt::crypt(password, params, salt)?;
	let y_prefix_len = "$y$".len() + params.len() + 1 + salt.len() + 1;
	let y_digest = encoding::scrypt_b64_decode(&y_hash[y_prefix_len..])
		.ok_or_else(|| PasswdError::Kdf("yescrypt digest is not valid crypt base64".to_owned()))?;

	let mut settings = format!("$gy${}$", params).into_bytes();
	settings.extend_from_slice(salt);

	let key: [u8; 32] = Streebog256::digest(password).into();
	let key = hmac_streebog256(&key, &settings)?;
	let tag = hmac_streebog256(&key, &y_digest)?;

	let mut hash = settings;
	hash.push(b'$');
	hash.extend(encoding::scrypt_b64_encode(&tag));
	Ok(hash)
}

fn hmac_streebog256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PasswdError> {
	let mut mac = HmacStreebog256::new_from_slice(key)
		.map_err(|_| PasswdError::Kdf("invalid HMAC-Streebog key".to_owned()))?;
	mac.update(data);
	Ok(mac.finalize().into_bytes().to_vec())
}
