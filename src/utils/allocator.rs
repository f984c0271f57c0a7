use crate::error::{AppError, AppResult};
use crate::models::PacketPolicy;
use rand::Rng;

/// 校验红包拆分参数。所有金额均为美分。
/// 创建红包前调用, 不满足时不开启任何事务。
pub fn validate_split(total: i64, count: i64, min_share: i64) -> AppResult<()> {
    if count < 1 {
        return Err(AppError::InvalidCount(
            "Share count must be at least 1".to_string(),
        ));
    }
    if total <= 0 {
        return Err(AppError::InvalidAmount(
            "Total amount must be positive".to_string(),
        ));
    }
    if min_share <= 0 {
        return Err(AppError::InvalidAmount(
            "Minimum share must be positive".to_string(),
        ));
    }
    let floor = count
        .checked_mul(min_share)
        .ok_or_else(|| AppError::InvalidAmount("Amount out of range".to_string()))?;
    if total < floor {
        return Err(AppError::InvalidAmount(format!(
            "Total amount {total} cannot cover {count} shares of at least {min_share}"
        )));
    }
    Ok(())
}

/// 一次性拆出全部份额。
///
/// - equal: 前 N-1 份向下取整, 最后一份拿精确余数
/// - lucky: 逐份在 [min_share, min(2*remaining/份数, remaining-预留)] 内均匀抽取,
///   最后一份拿精确余数
///
/// 返回的序列满足: sum == total, 每份 >= min_share。
pub fn split_amount(
    total: i64,
    count: i64,
    policy: PacketPolicy,
    min_share: i64,
) -> AppResult<Vec<i64>> {
    validate_split(total, count, min_share)?;

    let count_usize = count as usize;
    let mut shares = Vec::with_capacity(count_usize);

    match policy {
        PacketPolicy::Equal => {
            let per = total / count;
            for _ in 0..count_usize - 1 {
                shares.push(per);
            }
            shares.push(total - per * (count - 1));
        }
        PacketPolicy::Lucky => {
            let mut rng = rand::thread_rng();
            let mut remaining = total;
            let mut shares_left = count;
            while shares_left > 1 {
                // 预留保证后续每份至少 min_share
                let reserve = (shares_left - 1) * min_share;
                let mut upper = (2 * remaining / shares_left).min(remaining - reserve);
                if upper < min_share {
                    upper = min_share;
                }
                let share = rng.gen_range(min_share..=upper);
                shares.push(share);
                remaining -= share;
                shares_left -= 1;
            }
            shares.push(remaining);
        }
    }

    Ok(shares)
}

/// 领取时按需抽取单份 (懒拆分)。
///
/// 只剩一份时必须返回精确余数, 否则总额守恒会被破坏。
/// 调用方在行锁内调用并对返回值做守恒断言。
pub fn next_share(
    remain_amount: i64,
    remain_count: i64,
    policy: PacketPolicy,
    min_share: i64,
) -> AppResult<i64> {
    if remain_count < 1 || min_share <= 0 || remain_amount < remain_count * min_share {
        // 到这里说明红包行上的计数器已经被破坏
        return Err(AppError::InternalError(format!(
            "Inconsistent packet remainder: amount={remain_amount} count={remain_count}"
        )));
    }

    if remain_count == 1 {
        return Ok(remain_amount);
    }

    let share = match policy {
        PacketPolicy::Equal => remain_amount / remain_count,
        PacketPolicy::Lucky => {
            let reserve = (remain_count - 1) * min_share;
            let mut upper = (remain_amount - reserve).min(remain_amount / 2);
            if upper < min_share {
                upper = min_share;
            }
            rand::thread_rng().gen_range(min_share..=upper)
        }
    };

    Ok(share)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_split_exact_sum() {
        let shares = split_amount(10_000, 3, PacketPolicy::Equal, 1).unwrap();
        assert_eq!(shares, vec![3333, 3333, 3334]);
        assert_eq!(shares.iter().sum::<i64>(), 10_000);
    }

    #[test]
    fn test_lucky_split_sum_and_min_share() {
        // 多轮随机抽取, 验证守恒与下限
        for _ in 0..200 {
            let shares = split_amount(10_000, 10, PacketPolicy::Lucky, 1).unwrap();
            assert_eq!(shares.len(), 10);
            assert_eq!(shares.iter().sum::<i64>(), 10_000);
            assert!(shares.iter().all(|&s| s >= 1));
        }
    }

    #[test]
    fn test_single_share_takes_everything() {
        let shares = split_amount(500, 1, PacketPolicy::Lucky, 1).unwrap();
        assert_eq!(shares, vec![500]);
        let shares = split_amount(500, 1, PacketPolicy::Equal, 1).unwrap();
        assert_eq!(shares, vec![500]);
    }

    #[test]
    fn test_total_exactly_count_times_min_share() {
        // 恰好够发: 每份都必须正好是 min_share
        for policy in [PacketPolicy::Lucky, PacketPolicy::Equal] {
            let shares = split_amount(10, 10, policy, 1).unwrap();
            assert_eq!(shares, vec![1; 10]);
        }
        let shares = split_amount(250, 5, PacketPolicy::Lucky, 50).unwrap();
        assert_eq!(shares, vec![50; 5]);
    }

    #[test]
    fn test_rejects_total_below_floor() {
        let err = split_amount(9, 10, PacketPolicy::Lucky, 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            split_amount(100, 0, PacketPolicy::Lucky, 1),
            Err(AppError::InvalidCount(_))
        ));
        assert!(matches!(
            split_amount(0, 1, PacketPolicy::Lucky, 1),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            split_amount(100, 2, PacketPolicy::Lucky, 0),
            Err(AppError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_lucky_share_bounded_by_half_of_fair_double() {
        // 单份不超过剩余均值的两倍
        for _ in 0..100 {
            let shares = split_amount(10_000, 10, PacketPolicy::Lucky, 1).unwrap();
            let mut remaining = 10_000i64;
            let mut left = 10i64;
            for &share in shares.iter().take(9) {
                assert!(share <= 2 * remaining / left);
                remaining -= share;
                left -= 1;
            }
        }
    }

    #[test]
    fn test_next_share_drains_to_exact_zero() {
        for policy in [PacketPolicy::Lucky, PacketPolicy::Equal] {
            for _ in 0..100 {
                let total = 10_000i64;
                let mut remaining = total;
                let mut count = 10i64;
                let mut drawn = Vec::new();
                while count > 0 {
                    let share = next_share(remaining, count, policy, 1).unwrap();
                    assert!(share >= 1);
                    drawn.push(share);
                    remaining -= share;
                    count -= 1;
                }
                assert_eq!(remaining, 0);
                assert_eq!(drawn.iter().sum::<i64>(), total);
            }
        }
    }

    #[test]
    fn test_next_share_last_claim_gets_exact_remainder() {
        assert_eq!(next_share(777, 1, PacketPolicy::Lucky, 1).unwrap(), 777);
        assert_eq!(next_share(777, 1, PacketPolicy::Equal, 1).unwrap(), 777);
    }

    #[test]
    fn test_next_share_lucky_upper_bound() {
        // 抽取值不超过剩余金额的一半 (除非一半低于 min_share)
        for _ in 0..200 {
            let share = next_share(10_000, 5, PacketPolicy::Lucky, 1).unwrap();
            assert!(share >= 1);
            assert!(share <= 5_000);
        }
        // 剩余一半低于 min_share 时退化为 min_share
        let share = next_share(2, 2, PacketPolicy::Lucky, 1).unwrap();
        assert_eq!(share, 1);
    }

    #[test]
    fn test_next_share_detects_corrupted_remainder() {
        let err = next_share(1, 2, PacketPolicy::Lucky, 1).unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        let err = next_share(100, 0, PacketPolicy::Lucky, 1).unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
