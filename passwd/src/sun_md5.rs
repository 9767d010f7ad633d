//! Sun MD5, the Solaris `$md5` scheme.

use md5::{Digest, Md5};

use crate::encoding;

/// Iterations performed before any `rounds=` parameter adds more.
const BASE_ROUNDS: u64 = 4096;

const SALT_MAX: usize = 8;

/// Hamlet's soliloquy, mixed into an iteration whenever the coin toss says
/// so. The trailing NUL is part of the input, and the exact punctuation of
/// this particular edition matters.
const HAMLET_QUOTATION: &str = "To be, or not to be,--that is the question:--\n\
	Whether 'tis nobler in the mind to suffer\n\
	The slings and arrows of outrageous fortune\n\
	Or to take arms against a sea of troubles,\n\
	And by opposing end them?--To die,--to sleep,--\n\
	No more; and by a sleep to say we end\n\
	The heartache, and the thousand natural shocks\n\
	That flesh is heir to,--'tis a consummation\n\
	Devoutly to be wish'd. To die,--to sleep;--\n\
	To sleep! perchance to dream:--ay, there's the rub;\n\
	For in that sleep of death what dreams may come,\n\
	When we have shuffled off this mortal coil,\n\
	Must give us pause: there's the respect\n\
	That makes calamity of so long life;\n\
	For who would bear the whips and scorns of time,\n\
	The oppressor's wrong, the proud man's contumely,\n\
	The pangs of despis'd love, the law's delay,\n\
	The insolence of office, and the spurns\n\
	That patient merit of the unworthy takes,\n\
	When he himself might his quietus make\n\
	With a bare bodkin? who would these fardels bear,\n\
	To grunt and sweat under a weary life,\n\
	But that the dread of something after death,--\n\
	The undiscover'd country, from whose bourn\n\
	No traveller returns,--puzzles the will,\n\
	And makes us rather bear those ills we have\n\
	Than fly to others that we know not of?\n\
	Thus conscience does make cowards of us all;\n\
	And thus the native hue of resolution\n\
	Is sicklied o'er with the pale cast of thought;\n\
	And enterprises of great pith and moment,\n\
	With this regard, their currents turn awry,\n\
	And lose the name of action.--Soft you now!\n\
	The fair Ophelia!--Nymph, in thy orisons\n\
	Be all my sins remember'd.\n\0";

/// Treats the digest as 128 bits and returns bit `n mod 128`.
fn nth_bit(digest: &[u8; 16], n: u64) -> u32 {
	let n = (n % 128) as usize;
	((digest[n / 8] >> (n % 8)) & 1) as u32
}

/// The pseudorandom coin toss deciding whether the quotation joins an
/// iteration's input.
fn muffet_coin_toss(digest: &[u8; 16], iteration: u64) -> bool {
	let mut x = 0u32;
	let mut y = 0u32;
	for i in 0..8 {
		let a = digest[i % 16] as u32;
		let b = digest[(i + 3) % 16] as u32;
		let r = a >> (b % 5);
		let mut v = digest[(r % 16) as usize] as u32;
		if b & (1 << (a % 8)) != 0 {
			v /= 2;
		}
		x |= nth_bit(digest, v as u64) << i;

		let a = digest[(i + 8) % 16] as u32;
		let b = digest[(i + 11) % 16] as u32;
		let r = a >> (b % 5);
		let mut v = digest[(r % 16) as usize] as u32;
		if b & (1 << (a % 8)) != 0 {
			v /= 2;
		}
		y |= nth_bit(digest, v as u64) << i;
	}

	if nth_bit(digest, iteration) == 1 {
		x /= 2;
	}
	if nth_bit(digest, iteration + 64) == 1 {
		y /= 2;
	}

	nth_bit(digest, x as u64) ^ nth_bit(digest, y as u64) != 0
}

/// Hashes a password with the Sun MD5 construction. `additional_rounds`
/// on top of the 4096 base come from the `rounds=` parameter; zero means
/// the parameter was absent and it is left out of the emitted settings.
pub(crate) fn crypt(password: &[u8], salt: &[u8], additional_rounds: u64) -> Vec<u8> {
	let salt = &salt[..salt.len().min(SALT_MAX)];
	let iterations = BASE_ROUNDS + additional_rounds;

	// The settings prefix, trailing '$' included, is itself hashed.
	let mut settings = if additional_rounds != 0 {
		format!("$md5,rounds={}$", additional_rounds).into_bytes()
	} else {
		b"$md5$".to_vec()
	};
	settings.extend_from_slice(salt);
	settings.push(b'$');

	let mut buf = Vec::new();
	buf.extend_from_slice(password);
	buf.extend_from_slice(&settings);
	let mut result: [u8; 16] = Md5::digest(&buf).into();

	for i in 0..iterations {
		let mut buf = Vec::new();
		buf.extend_from_slice(&result);
		if muffet_coin_toss(&result, i) {
			buf.extend_from_slice(HAMLET_QUOTATION.as_bytes());
		}
		buf.extend_from_slice(i.to_string().as_bytes());
		result = Md5::digest(&buf).into();
	}

	let mut hash = settings;
	hash.push(b'$');
	hash.extend(encoding::md5_b64_encode(&result));
	hash
}
