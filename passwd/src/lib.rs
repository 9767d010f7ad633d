//! Password hashing and verification for the crypt(3) family of textual
//! encodings, compatible with the hashes found in `/etc/shadow`.

mod encoding;
mod gost_yescrypt;
mod kdf;
mod md5_crypt;
mod nt_hash;
mod scrypt_crypt;
mod sha1_crypt;
mod sha2_crypt;
mod sun_md5;
mod yescrypt_crypt;

use constant_time_eq::constant_time_eq;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2_crypt::Sha2Mode;
use thiserror::Error;

/// The magic prefix for PBKDF1/SHA-1 hashes.
const SHA1_CRYPT_MAGIC: &str = "$sha1$";

/// The magic prefix for Sun MD5 hashes. Deliberately not `$`-terminated:
/// the optional `,rounds=` parameter attaches directly to it.
const SUN_MD5_MAGIC: &str = "$md5";

/// The magic prefix for MD5-crypt hashes.
const MD5_CRYPT_MAGIC: &str = "$1$";

/// The magic prefix for NT hashes.
const NT_HASH_MAGIC: &str = "$3$";

/// The magic prefix for SHA-256 crypt hashes.
const SHA256_CRYPT_MAGIC: &str = "$5$";

/// The magic prefix for SHA-512 crypt hashes.
const SHA512_CRYPT_MAGIC: &str = "$6$";

/// The magic prefix for scrypt hashes.
const S_CRYPT_MAGIC: &str = "$7$";

/// The magic prefix for yescrypt hashes.
const YES_CRYPT_MAGIC: &str = "$y$";

/// The magic prefix for GOST yescrypt hashes.
const GOST_YES_CRYPT_MAGIC: &str = "$gy$";

/// The closed set of supported hashing schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
	/// PBKDF1 with HMAC-SHA-1 (`$sha1$`).
	Sha1,

	/// Sun MD5 (`$md5`).
	SunMd5,

	/// FreeBSD MD5-crypt (`$1$`).
	Md5Crypt,

	/// NT LAN Manager MD4 (`$3$`).
	Nt,

	/// glibc SHA-256 crypt (`$5$`).
	Sha256Crypt,

	/// glibc SHA-512 crypt (`$6$`).
	Sha512Crypt,

	/// scrypt (`$7$`).
	SCrypt,

	/// yescrypt (`$y$`).
	YesCrypt,

	/// GOST R 34.11-2012 wrapped yescrypt (`$gy$`).
	GostYesCrypt,
}

impl Algorithm {
	/// The `$`-delimited prefix identifying this scheme inside a hash
	/// string.
	pub fn magic(&self) -> &'static str {
		match self {
			Algorithm::Sha1 => SHA1_CRYPT_MAGIC,
			Algorithm::SunMd5 => SUN_MD5_MAGIC,
			Algorithm::Md5Crypt => MD5_CRYPT_MAGIC,
			Algorithm::Nt => NT_HASH_MAGIC,
			Algorithm::Sha256Crypt => SHA256_CRYPT_MAGIC,
			Algorithm::Sha512Crypt => SHA512_CRYPT_MAGIC,
			Algorithm::SCrypt => S_CRYPT_MAGIC,
			Algorithm::YesCrypt => YES_CRYPT_MAGIC,
			Algorithm::GostYesCrypt => GOST_YES_CRYPT_MAGIC,
		}
	}

	/// The number of salt characters generated when no salt is supplied,
	/// or `None` for schemes that never salt.
	fn salt_length(&self) -> Option<usize> {
		match self {
			Algorithm::Nt => None,
			Algorithm::Md5Crypt | Algorithm::SunMd5 => Some(8),
			Algorithm::Sha1 | Algorithm::Sha256Crypt | Algorithm::Sha512Crypt => Some(16),
			Algorithm::SCrypt | Algorithm::YesCrypt | Algorithm::GostYesCrypt => Some(22),
		}
	}

	fn default_params(&self) -> &'static str {
		match self {
			Algorithm::Sha1 => "262144",
			// N=16384, r=32, p=1 in the $7$ parameter encoding.
			Algorithm::SCrypt => "CU..../....",
			// N=2048, r=31 in the $y$ parameter encoding.
			Algorithm::YesCrypt | Algorithm::GostYesCrypt => "j9T",
			_ => "",
		}
	}
}

/// A single use hashing engine: one scheme plus its parameter text and
/// salt. Engines are configured, used for one hash or verification, and
/// discarded; distinct engines are safe to use in parallel.
pub struct PasswordHasher {
	algorithm: Algorithm,

	/// Algorithm specific parameter text, e.g. "rounds=5000" or "j9T".
	params: String,

	/// The textual, alphabet encoded salt. The text bytes are what the
	/// engines feed into the underlying digests, never the raw random
	/// bytes behind them.
	salt: Vec<u8>,
}

impl PasswordHasher {
	/// Creates an engine with the scheme's default parameters and no salt.
	pub fn new(algorithm: Algorithm) -> Self {
		Self {
			algorithm,
			params: algorithm.default_params().to_owned(),
			salt: Vec::new(),
		}
	}

	/// Builds a configured engine from a crypt settings string. A full
	/// hash works too: the digest fields are simply ignored, which is what
	/// lets [`check_password`] re-hash under identical settings.
	pub fn from_settings(settings: &str) -> Result<Self, PasswdError> {
		// PBKDF1/SHA-1: $sha1$<iterations>$<salt>[$<digest>]
		if let Some(rest) = settings.strip_prefix(SHA1_CRYPT_MAGIC) {
			let fields: Vec<&str> = rest.split('$').collect();
			if fields.len() < 2 {
				return Err(PasswdError::Malformed("too few fields for a sha1 hash".to_owned()));
			}
			let iterations: u64 = fields[0].parse().map_err(|_| {
				PasswdError::Malformed(format!("malformed iteration count: {}", fields[0]))
			})?;

			let mut hasher = Self::new(Algorithm::Sha1);
			hasher.params = iterations.to_string();
			hasher.salt = fields[1].as_bytes().to_vec();
			return Ok(hasher);
		}

		// Sun MD5: $md5[,rounds=<N>]$<salt>[$][$<digest>]
		if let Some(rest) = settings.strip_prefix(SUN_MD5_MAGIC) {
			let fields: Vec<&str> = rest.split('$').collect();
			if fields.len() < 2 {
				return Err(PasswdError::Malformed("too few fields for a sun md5 hash".to_owned()));
			}
			let params = fields[0].strip_prefix(',').unwrap_or(fields[0]);
			if !params.is_empty() {
				parse_rounds(params)?;
			}

			let mut hasher = Self::new(Algorithm::SunMd5);
			hasher.params = params.to_owned();
			hasher.salt = fields[1].as_bytes().to_vec();
			return Ok(hasher);
		}

		// MD5-crypt: $1$<salt>[$<digest>]
		if let Some(rest) = settings.strip_prefix(MD5_CRYPT_MAGIC) {
			let fields: Vec<&str> = rest.split('$').collect();
			let mut hasher = Self::new(Algorithm::Md5Crypt);
			hasher.salt = fields[0].as_bytes().to_vec();
			return Ok(hasher);
		}

		// NT: $3$[$<digest>]. Nothing to configure.
		if settings.starts_with(NT_HASH_MAGIC) {
			return Ok(Self::new(Algorithm::Nt));
		}

		// SHA-crypt: $5$[rounds=<N>$]<salt>[$<digest>], likewise $6$.
		for (magic, algorithm) in [
			(SHA256_CRYPT_MAGIC, Algorithm::Sha256Crypt),
			(SHA512_CRYPT_MAGIC, Algorithm::Sha512Crypt),
		] {
			if let Some(rest) = settings.strip_prefix(magic) {
				let fields: Vec<&str> = rest.split('$').collect();
				let (rounds, salt) = if fields[0].starts_with("rounds=") {
					if fields.len() < 2 {
						return Err(PasswdError::Malformed(format!(
							"too few fields for a {} hash",
							magic
						)));
					}
					(parse_rounds(fields[0])?, fields[1])
				} else {
					(0, fields[0])
				};
				if salt.is_empty() {
					return Err(PasswdError::Malformed(format!("missing salt after {}", magic)));
				}

				let mut hasher = Self::new(algorithm);
				if rounds != 0 {
					hasher.params = format!("rounds={}", rounds);
				}
				hasher.salt = salt.as_bytes().to_vec();
				return Ok(hasher);
			}
		}

		// scrypt: $7$<11 parameter characters><salt>[$<digest>]
		if let Some(rest) = settings.strip_prefix(S_CRYPT_MAGIC) {
			let fields: Vec<&str> = rest.split('$').collect();
			if fields[0].len() < 12 || !fields[0].is_char_boundary(11) {
				return Err(PasswdError::Malformed(format!(
					"malformed scrypt parameter block: {}",
					fields[0]
				)));
			}
			let (params, salt) = fields[0].split_at(11);

			let mut hasher = Self::new(Algorithm::SCrypt);
			hasher.params = params.to_owned();
			hasher.salt = salt.as_bytes().to_vec();
			return Ok(hasher);
		}

		// yescrypt: $y$<3 parameter characters>$<salt>[$<digest>], and its
		// GOST wrapping under $gy$.
		for (magic, algorithm) in [
			(YES_CRYPT_MAGIC, Algorithm::YesCrypt),
			(GOST_YES_CRYPT_MAGIC, Algorithm::GostYesCrypt),
		] {
			if let Some(rest) = settings.strip_prefix(magic) {
				let fields: Vec<&str> = rest.split('$').collect();
				if fields.len() < 2 {
					return Err(PasswdError::Malformed(format!(
						"too few fields for a {} hash",
						magic
					)));
				}
				if fields[0].len() != 3 {
					return Err(PasswdError::Malformed(format!(
						"invalid parameter length for a {} hash",
						magic
					)));
				}

				let mut hasher = Self::new(algorithm);
				hasher.params = fields[0].to_owned();
				hasher.salt = fields[1].as_bytes().to_vec();
				return Ok(hasher);
			}
		}

		Err(PasswdError::NoMatchingAlgorithm)
	}

	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	pub fn params(&self) -> &str {
		&self.params
	}

	pub fn salt(&self) -> &[u8] {
		&self.salt
	}

	/// Replaces the parameter text. The text is not validated here; a bad
	/// parameter surfaces when the engine hashes.
	pub fn set_params(&mut self, params: &str) {
		self.params = params.to_owned();
	}

	/// Replaces the salt. An empty salt means a fresh one is generated on
	/// first use.
	pub fn set_salt(&mut self, salt: &[u8]) {
		self.salt = salt.to_vec();
	}

	/// Configures the `$7$` parameter block from plain integers. `n` must
	/// be a power of two.
	pub fn set_scrypt_params(&mut self, n: u64, r: u32, p: u32) -> Result<(), PasswdError> {
		let n_log2 = encoding::n_log2(n)
			.ok_or_else(|| PasswdError::Malformed(format!("scrypt N {} is not a power of two", n)))?;

		let mut params = String::with_capacity(11);
		params.push(encoding::itoa64(n_log2)? as char);
		for c in encoding::b64_uint32_encode(r, 30)? {
			params.push(c as char);
		}
		for c in encoding::b64_uint32_encode(p, 30)? {
			params.push(c as char);
		}
		self.params = params;
		Ok(())
	}

	/// Configures the `$y$`/`$gy$` parameter block. `n` must be a power of
	/// two and `r` below 64.
	pub fn set_yescrypt_params(&mut self, n: u64, r: u32) -> Result<(), PasswdError> {
		let n_log2 = encoding::n_log2(n)
			.ok_or_else(|| PasswdError::Malformed(format!("yescrypt N {} is not a power of two", n)))?;
		self.params = format!(
			"j{}{}",
			encoding::itoa64(n_log2)? as char,
			encoding::itoa64(r)? as char
		);
		Ok(())
	}

	/// Generates a fresh salt for this scheme: salt-length random bytes,
	/// base64 encoded and cut to the scheme's standard salt width.
	pub fn generate_salt(&self) -> Result<Vec<u8>, PasswdError> {
		let Some(length) = self.algorithm.salt_length() else {
			return Ok(Vec::new());
		};

		match self.algorithm {
			Algorithm::SCrypt | Algorithm::YesCrypt | Algorithm::GostYesCrypt => {
				// 16 random bytes encode to the standard 22 character
				// salt, which must itself decode cleanly for the yescrypt
				// KDF.
				let mut raw = [0u8; 16];
				OsRng.try_fill_bytes(&mut raw)?;
				Ok(encoding::scrypt_b64_encode(&raw))
			}
			_ => {
				let mut raw = vec![0u8; length];
				OsRng.try_fill_bytes(&mut raw)?;
				let mut salt = encoding::b64_encode(&raw);
				salt.truncate(length);
				Ok(salt)
			}
		}
	}

	/// Hashes a password, generating and storing a salt first if none is
	/// set. Returns the full hash string as bytes.
	pub fn hash_password(&mut self, password: &[u8]) -> Result<Vec<u8>, PasswdError> {
		if self.salt.is_empty() {
			self.salt = self.generate_salt()?;
		}
		let salt = self.salt.clone();
		self.hash_with_salt(password, &salt)
	}

	/// Hashes a password under an explicit salt.
	pub fn hash_with_salt(&self, password: &[u8], salt: &[u8]) -> Result<Vec<u8>, PasswdError> {
		match self.algorithm {
			Algorithm::Sha1 => {
				let iterations = self.params.parse().map_err(|_| {
					PasswdError::Malformed(format!("malformed iteration count: {}", self.params))
				})?;
				Ok(sha1_crypt::crypt(password, salt, iterations))
			}
			Algorithm::SunMd5 => Ok(sun_md5::crypt(password, salt, parse_rounds(&self.params)?)),
			Algorithm::Md5Crypt => Ok(md5_crypt::crypt(password, salt)),
			Algorithm::Nt => Ok(nt_hash::crypt(password)),
			Algorithm::Sha256Crypt => {
				Ok(Sha2Mode::Sha256.crypt(password, salt, parse_rounds(&self.params)?))
			}
			Algorithm::Sha512Crypt => {
				Ok(Sha2Mode::Sha512.crypt(password, salt, parse_rounds(&self.params)?))
			}
			Algorithm::SCrypt => scrypt_crypt::crypt(password, &self.params, salt),
			Algorithm::YesCrypt => yescrypt_crypt::crypt(password, &self.params, salt),
			Algorithm::GostYesCrypt => gost_yescrypt::crypt(password, &self.params, salt),
		}
	}
}

/// Verifies a password against a crypt hash string by re-hashing it under
/// the hash's own settings and comparing. Returns `Ok(false)` for a well
/// formed hash that does not match; malformed hashes and primitive
/// failures are errors.
pub fn check_password(hash: &[u8], password: &[u8]) -> Result<bool, PasswdError> {
	let settings = std::str::from_utf8(hash)
		.map_err(|_| PasswdError::Malformed("hash is not valid UTF-8".to_owned()))?;
	let mut hasher = PasswordHasher::from_settings(settings)?;
	let rehash = hasher.hash_password(password)?;
	Ok(constant_time_eq(hash, &rehash))
}

/// Parses an optional `rounds=<N>` parameter. An empty parameter string
/// means the scheme default, returned as zero.
fn parse_rounds(params: &str) -> Result<u64, PasswdError> {
	if params.is_empty() {
		return Ok(0);
	}
	params
		.strip_prefix("rounds=")
		.and_then(|v| v.parse().ok())
		.ok_or_else(|| PasswdError::Malformed(format!("malformed rounds parameter: {}", params)))
}

/// Errors surfaced by hashing and verification.
#[derive(Error, Debug)]
pub enum PasswdError {
	#[error("malformed settings: {0}")]
	Malformed(String),

	#[error("no valid matching algorithm")]
	NoMatchingAlgorithm,

	#[error("value {0} out of range for crypt base64")]
	EncodingRange(u32),

	#[error("random source failure: {0}")]
	Rng(#[from] rand::Error),

	#[error("key derivation failed: {0}")]
	Kdf(String),
}

#[cfg(test)]
mod test {
	use super::*;

	const PASSWORD: &[u8] = b"Test";

	const ALGORITHMS: [Algorithm; 9] = [
		Algorithm::Sha1,
		Algorithm::SunMd5,
		Algorithm::Md5Crypt,
		Algorithm::Nt,
		Algorithm::Sha256Crypt,
		Algorithm::Sha512Crypt,
		Algorithm::SCrypt,
		Algorithm::YesCrypt,
		Algorithm::GostYesCrypt,
	];

	/// Reference hashes of the password `Test`, generated with mkpasswd
	/// and friends.
	const VECTORS: &[&str] = &[
		"$sha1$245081$NabW/sfk3ZVVQc4BnZ/3$YoV1Iva6GK4tkxwahBmyH0TRCwBO",
		"$md5$lORrojKC$$RD9p64URLn3Wkv4Wa2xOW0",
		"$md5,rounds=53125$qrDebYUd$$3pJWS.a6VTC/cGehIfQb30",
		"$1$wuIXYcHV$1ufSGHoD0EkWPr75i52ST/",
		"$3$$4a1fab8f6b5441e0493dc7d41304bfb6",
		"$5$AsETvlsIoaTP3w6G$OZY9mWRFXR9Pz0Xv1pS2TS/QCpxECLEG/dru/Y.nba/",
		"$5$rounds=243006$oCvhLw/Nn9HuQIm4$VPKzWx9t.NHgmNpVHeSpzQ5y01z4BE14J.bvG8g2yi.",
		"$6$zt7D9I3Uu.EhrzEv$j50OCJ3oNdO2Ee7RE9XTDF7dhvrgRwc9NmjJUouk7czn4JTc/A6qLJIT1pMk7FUlTCYCLl6uBHm5NoEboAzIo0",
		"$6$rounds=523044$.zMtRwbPP2sDg5a5$YgKUnqEda6wxkvDMbJoNjNBiFNpX7nP/uDFV3jV4ngmrXlFBua3n8oIi5St/Re8H3WOksLaody3eAhaGtAN0c/",
		"$7$CU..../....PpL3ULxY5DvYyvasS/a4a0$jqgg90svZLt5KQqFTwegHSn1pXU.aKDavZ3Eq8t2wx9",
		"$y$j9T$G/uoZu1orhwOE/lUtohEa.$SMu/wxtyhBLa5xeRLVnznBx5vE0/VxY7rJZlQX27N84",
		"$gy$j9T$etkZHzB483TIuw/58Df.N/$7DjHx/8jx.E/VLdyzMIIOJULHoZJ1PNlFl71KXaf0s7",
	];

	#[test]
	fn test_known_hashes_verify() {
		for vector in VECTORS {
			assert!(check_password(vector.as_bytes(), PASSWORD).unwrap(), "{}", vector);
		}
	}

	#[test]
	fn test_modified_hashes_fail() {
		for vector in VECTORS {
			let mut broken = vector.as_bytes().to_vec();
			let last = broken.last_mut().unwrap();
			*last = if *last == b'.' { b'/' } else { b'.' };
			assert!(!check_password(&broken, PASSWORD).unwrap(), "{}", vector);
		}
	}

	#[test]
	fn test_wrong_password_fails() {
		for vector in VECTORS {
			assert!(!check_password(vector.as_bytes(), b"Toast").unwrap(), "{}", vector);
		}
	}

	#[test]
	fn test_hash_round_trips() {
		for algorithm in ALGORITHMS {
			let mut hasher = PasswordHasher::new(algorithm);
			let hash = hasher.hash_password(PASSWORD).unwrap();
			assert!(check_password(&hash, PASSWORD).unwrap(), "{:?}", algorithm);
			assert!(!check_password(&hash, b"wrong").unwrap(), "{:?}", algorithm);
		}
	}

	#[test]
	fn test_malformed_settings_are_rejected() {
		let cases = [
			"",
			"plaintext",
			"$2a$10$abcdefghijklmnopqrstuv",
			"$5$",
			"$6$",
			"$6$rounds=5000",
			"$7$short",
			"$sha1$notanumber$salt",
			"$md5,bogus$salt",
			"$y$j9$salt",
			"$y$j9TT$salt",
			"$gy$j9T",
		];
		for settings in cases {
			assert!(PasswordHasher::from_settings(settings).is_err(), "{}", settings);
		}
	}

	#[test]
	fn test_from_settings_extracts_fields() {
		let hasher = PasswordHasher::from_settings("$6$rounds=5000$salty$ignored").unwrap();
		assert_eq!(hasher.algorithm(), Algorithm::Sha512Crypt);
		assert_eq!(hasher.params(), "rounds=5000");
		assert_eq!(hasher.salt(), b"salty");

		let hasher = PasswordHasher::from_settings("$7$CU..../....somesalt").unwrap();
		assert_eq!(hasher.params(), "CU..../....");
		assert_eq!(hasher.salt(), b"somesalt");

		let hasher = PasswordHasher::from_settings("$md5$lORrojKC$$junk").unwrap();
		assert_eq!(hasher.algorithm(), Algorithm::SunMd5);
		assert_eq!(hasher.params(), "");
		assert_eq!(hasher.salt(), b"lORrojKC");
	}

	#[test]
	fn test_explicit_default_rounds_are_emitted() {
		let hasher = PasswordHasher::from_settings("$6$rounds=5000$salt").unwrap();
		let hash = hasher.hash_with_salt(PASSWORD, hasher.salt()).unwrap();
		assert!(hash.starts_with(b"$6$rounds=5000$salt$"));

		let mut hasher = PasswordHasher::new(Algorithm::Sha512Crypt);
		hasher.set_salt(b"salt");
		let hash = hasher.hash_password(PASSWORD).unwrap();
		assert!(hash.starts_with(b"$6$salt$"));
	}

	#[test]
	fn test_generated_salt_lengths() {
		for algorithm in ALGORITHMS {
			let hasher = PasswordHasher::new(algorithm);
			let salt = hasher.generate_salt().unwrap();
			match algorithm.salt_length() {
				Some(expected) => {
					assert_eq!(salt.len(), expected, "{:?}", algorithm);
					assert!(
						salt.iter().all(|c| encoding::ALPHABET.contains(c)),
						"{:?}",
						algorithm
					);
				}
				None => assert!(salt.is_empty(), "{:?}", algorithm),
			}
		}
	}

	#[test]
	fn test_emitted_hashes_stay_in_the_alphabet() {
		for algorithm in ALGORITHMS {
			let mut hasher = PasswordHasher::new(algorithm);
			let hash = hasher.hash_password(PASSWORD).unwrap();
			for &c in &hash[algorithm.magic().len()..] {
				assert!(
					encoding::ALPHABET.contains(&c) || matches!(c, b'$' | b'=' | b','),
					"{:?} emitted {:?}",
					algorithm,
					c as char
				);
			}
		}
	}

	#[test]
	fn test_set_scrypt_params() {
		let mut hasher = PasswordHasher::new(Algorithm::SCrypt);
		hasher.set_scrypt_params(16384, 32, 1).unwrap();
		assert_eq!(hasher.params(), "CU..../....");
		assert!(hasher.set_scrypt_params(1000, 8, 1).is_err());
	}

	#[test]
	fn test_set_yescrypt_params() {
		let mut hasher = PasswordHasher::new(Algorithm::YesCrypt);
		hasher.set_yescrypt_params(2048, 31).unwrap();
		assert_eq!(hasher.params(), "j9T");
		assert!(hasher.set_yescrypt_params(2048, 64).is_err());
		assert!(hasher.set_yescrypt_params(1000, 31).is_err());
	}

	#[test]
	fn test_nt_ignores_salt() {
		let hasher = PasswordHasher::new(Algorithm::Nt);
		let salted = hasher.hash_with_salt(PASSWORD, b"somesalt").unwrap();
		let unsalted = hasher.hash_with_salt(PASSWORD, b"").unwrap();
		assert_eq!(salted, unsalted);
	}

	#[test]
	fn test_undecodable_yescrypt_salt_is_an_error() {
		assert!(check_password(b"$y$j9T$!!bad!!$digest", PASSWORD).is_err());
	}
}
