use rust_decimal::Decimal;

/// Decimals of TRX on chain (1 TRX = 10^6 sun).
pub const TRX_DECIMALS: u32 = 6;
/// Decimals every amount is normalized to before it reaches the protocol chain.
pub const PROTOCOL_DECIMALS: u32 = 8;
/// Largest power of ten a u128 holds.
pub const MAX_DECIMALS: u32 = 38;

/// Integer rescale of `amount` from `from` decimals to `to` decimals.
/// Downscaling truncates; upscaling saturates instead of wrapping.
pub fn convert_decimals(amount: u128, from: u32, to: u32) -> u128 {
    if from == to {
        amount
    } else if from < to {
        match 10u128.checked_pow(to - from) {
            Some(scale) => amount.saturating_mul(scale),
            None if amount == 0 => 0,
            None => u128::MAX,
        }
    } else {
        10u128.checked_pow(from - to).map_or(0, |scale| amount / scale)
    }
}

/// sun -> protocol units (x100).
pub fn sun_to_protocol(sun: u128) -> u128 {
    convert_decimals(sun, TRX_DECIMALS, PROTOCOL_DECIMALS)
}

/// protocol units -> sun (/100).
pub fn protocol_to_sun(amount: u128) -> u128 {
    convert_decimals(amount, PROTOCOL_DECIMALS, TRX_DECIMALS)
}

/// SUN을 TRX로 변환
pub fn sun_to_trx(sun: u64) -> Decimal {
    Decimal::from(sun) / Decimal::from(1_000_000u64)
}
