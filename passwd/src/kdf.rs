//! Narrow access to the scrypt and yescrypt key derivation functions.

use crate::PasswdError;

/// Derives `dk_len` bytes with scrypt.
pub(crate) fn scrypt_key(
	password: &[u8],
	salt: &[u8],
	n_log2: u8,
	r: u32,
	p: u32,
	dk_len: usize,
) -> Result<Vec<u8>, PasswdError> {
	let params = scrypt::Params::new(n_log2, r, p, dk_len).map_err(|_| {
		PasswdError::Kdf(format!("invalid scrypt parameters: N=2^{} r={} p={}", n_log2, r, p))
	})?;
	let mut dk = vec![0u8; dk_len];
	scrypt::scrypt(password, salt, &params, &mut dk)
		.map_err(|_| PasswdError::Kdf("invalid scrypt output length".to_owned()))?;
	Ok(dk)
}

/// Derives 32 bytes with the yescrypt default flavor (p = 1).
pub(crate) fn yescrypt_key(
	password: &[u8],
	salt: &[u8],
	n_log2: u8,
	r: u32,
) -> Result<[u8; 32], PasswdError> {
	let n: u64 = 1u64 << n_log2;
	let params = yescrypt::Params::new(yescrypt::Mode::default(), n, r, 1).map_err(|_| {
		PasswdError::Kdf(format!("invalid yescrypt parameters: N=2^{} r={}", n_log2, r))
	})?;
	let mut dk = [0u8; 32];
	yescrypt::yescrypt(password, salt, &params, &mut dk)
		.map_err(|_| PasswdError::Kdf("yescrypt key derivation failed".to_owned()))?;
	Ok(dk)
}
