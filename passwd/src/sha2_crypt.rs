//! SHA-256 and SHA-512 crypt, the glibc `$5$` and `$6$` schemes described
//! by [SHA-crypt.txt](https://akkadia.org/drepper/SHA-crypt.txt).

use ring::digest;

use crate::encoding;

const ROUNDS_DEFAULT: u64 = 5000;
const SALT_MAX: usize = 16;

pub(crate) enum Sha2Mode {
	Sha256,
	Sha512,
}

impl Sha2Mode {
	fn algorithm(&self) -> &'static digest::Algorithm {
		match self {
			Sha2Mode::Sha256 => &digest::SHA256,
			Sha2Mode::Sha512 => &digest::SHA512,
		}
	}

	fn magic(&self) -> &'static str {
		match self {
			Sha2Mode::Sha256 => "$5$",
			Sha2Mode::Sha512 => "$6$",
		}
	}

	/// The two digest widths rotate their output bytes in opposite
	/// directions before encoding.
	fn rotate_order(&self) -> bool {
		matches!(self, Sha2Mode::Sha512)
	}

	/// Hashes a password with the SHA-crypt construction. `rounds` of zero
	/// means the `rounds=` parameter was absent: the default count applies
	/// and the parameter is left out of the emitted settings.
	pub(crate) fn crypt(&self, password: &[u8], salt: &[u8], rounds: u64) -> Vec<u8> {
		let salt = &salt[..salt.len().min(SALT_MAX)];
		let custom_rounds = rounds != 0;
		let rounds = if custom_rounds { rounds } else { ROUNDS_DEFAULT };
		let algorithm = self.algorithm();

		// The alternate digest mixes password, salt, password.
		let mut buf = Vec::new();
		buf.extend_from_slice(password);
		buf.extend_from_slice(salt);
		buf.extend_from_slice(password);
		let alternate = digest::digest(algorithm, &buf);

		// Digest A covers password and salt, the alternate digest recycled
		// out to the password length, then the alternate digest or the
		// password for each bit of the password length.
		let mut buf = Vec::new();
		buf.extend_from_slice(password);
		buf.extend_from_slice(salt);
		encoding::recycle(&mut buf, alternate.as_ref(), password.len());
		let mut n = password.len();
		while n > 0 {
			if n & 1 != 0 {
				buf.extend_from_slice(alternate.as_ref());
			} else {
				buf.extend_from_slice(password);
			}
			n >>= 1;
		}
		let digest_a = digest::digest(algorithm, &buf);

		// Byte sequence P: the password digested once per password byte,
		// recycled back out to the password length.
		let mut buf = Vec::new();
		for _ in 0..password.len() {
			buf.extend_from_slice(password);
		}
		let digest_dp = digest::digest(algorithm, &buf);
		let mut p = Vec::new();
		encoding::recycle(&mut p, digest_dp.as_ref(), password.len());

		// Byte sequence S: the salt digested 16 + A[0] times, recycled out
		// to the salt length.
		let mut buf = Vec::new();
		for _ in 0..16 + digest_a.as_ref()[0] as usize {
			buf.extend_from_slice(salt);
		}
		let digest_ds = digest::digest(algorithm, &buf);
		let mut s = Vec::new();
		encoding::recycle(&mut s, digest_ds.as_ref(), salt.len());

		// The rounds interleave P, S and the running digest on the same
		// schedule MD5-crypt uses.
		let mut result = digest_a;
		for round in 0..rounds {
			let mut buf = Vec::new();
			if round & 1 != 0 {
				buf.extend_from_slice(&p);
			} else {
				buf.extend_from_slice(result.as_ref());
			}
			if round % 3 != 0 {
				buf.extend_from_slice(&s);
			}
			if round % 7 != 0 {
				buf.extend_from_slice(&p);
			}
			if round & 1 != 0 {
				buf.extend_from_slice(result.as_ref());
			} else {
				buf.extend_from_slice(&p);
			}
			result = digest::digest(algorithm, &buf);
		}

		let mut hash = if custom_rounds {
			format!("{}rounds={}$", self.magic(), rounds).into_bytes()
		} else {
			self.magic().as_bytes().to_vec()
		};
		hash.extend_from_slice(salt);
		hash.push(b'$');
		hash.extend(encoding::rotate_b64_encode(result.as_ref(), self.rotate_order()));
		hash
	}
}
