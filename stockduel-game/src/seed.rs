//! Reversible share-code scheme with a 64-word finance list.
//! Code format: SD-<WORD><NN>, e.g., SD-BULL42, SD-MOAT07

const PREFIX: &str = "SD";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "BULL", "BEAR", "YIELD", "EQUITY", "ASSET", "MARGIN", "LEDGER", "AUDIT", "RUPIAH", "BOURSE",
    "TICKER", "BROKER", "HEDGE", "OPTION", "FUTURE", "BOND", "COUPON", "RALLY", "CANDLE", "VOLUME",
    "SPREAD", "BOOK", "CASH", "REVENUE", "PROFIT", "EARNING", "CAPITAL", "SHARE", "STOCK", "INDEX",
    "SECTOR", "VALUE", "GROWTH", "MOAT", "ALPHA", "BETA", "GAMMA", "DELTA", "QUANT", "ANALYST",
    "REPORT", "FILING", "LISTING", "SPLIT", "BUYBACK", "RIGHTS", "WARRANT", "TENDER", "MERGER",
    "PIVOT", "TREND", "BREAKOUT", "SUPPORT", "RESIST", "TARGET", "UPSIDE", "PREMIUM", "DISCOUNT",
    "RATIO", "RETURN", "LEVERAGE", "PAYOUT", "DIVIDND", "TAPE",
];

const WORD_MASK: u16 = 0x003F;
const NN_SHIFT: u16 = 6;
const NN_MASK: u16 = 0x7F;

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & WORD_MASK | ((u16::from(nn) & NN_MASK) << NN_SHIFT)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = (packed >> NN_SHIFT) & NN_MASK;
    (packed & WORD_MASK, u8::try_from(nn).unwrap_or(0))
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [lo, hi] = packed.to_le_bytes();
    // Domain-separated FNV input
    let buf = [b'S', b'T', b'K', b'D', b'L', b'-', lo, hi, 0xA5];
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render any seed as a share code. Only the low 16 bits pick the code, so
/// distinct seeds can share one; decoding returns the canonical seed.
#[must_use]
pub fn encode_share_code(seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(wi))
        .copied()
        .unwrap_or(WORD_LIST[0]);
    format!("{PREFIX}-{word}{:02}", nn % 100)
}

/// Parse a share code back into its canonical seed. Case-insensitive.
#[must_use]
pub fn decode_share_code(code: &str) -> Option<u64> {
    let (prefix, rest) = code.trim().split_once('-')?;
    if !prefix.eq_ignore_ascii_case(PREFIX) || rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    if !nn_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| *w == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

/// Share code for `seed` when it is the canonical seed of that code.
#[must_use]
pub fn share_code_for(seed: u64) -> Option<String> {
    let code = encode_share_code(seed);
    (decode_share_code(&code) == Some(seed)).then_some(code)
}

/// Fresh share code from arbitrary entropy (clock, OS randomness).
#[must_use]
pub fn generate_share_code(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_share_code(compose_seed(wi, nn))
}
