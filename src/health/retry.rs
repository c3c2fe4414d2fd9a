//! 有界重试循环
//!
//! 按顺序执行尝试，失败后等待固定间隔再试，直到成功或次数耗尽

use std::future::Future;
use std::time::Duration;

/// 重试策略：最多尝试次数和固定退避间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（包含第一次）
    pub max_attempts: u32,
    /// 两次尝试之间的固定等待时间
    pub backoff: Duration,
}

impl RetryPolicy {
    /// 创建重试策略，尝试次数至少为1
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// 某次尝试成功的结果
#[derive(Debug)]
pub struct Succeeded<T> {
    pub value: T,
    /// 成功的是第几次尝试（从1开始）
    pub attempt: u32,
}

/// 所有尝试都失败
#[derive(Debug)]
pub struct Exhausted<E> {
    /// 最后一次尝试的错误
    pub error: E,
    pub attempts: u32,
}

/// 按策略执行 `operation`
///
/// `operation` 接收当前尝试序号（从1开始）。每次失败且仍有剩余次数时，
/// 先调用 `on_retry(失败的序号, &错误)`，再等待 `policy.backoff`。
/// N 次尝试之间最多 N-1 次等待，任一次成功立即返回。
pub async fn run_with_retry<T, E, F, Fut, R>(
    policy: RetryPolicy,
    mut operation: F,
    mut on_retry: R,
) -> Result<Succeeded<T>, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(Succeeded { value, attempt }),
            Err(error) => {
                if attempt >= max_attempts {
                    return Err(Exhausted {
                        error,
                        attempts: attempt,
                    });
                }
                on_retry(attempt, &error);
            }
        }

        tokio::time::sleep(policy.backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_uses_every_attempt() {
        for max_attempts in 1..=5u32 {
            let calls = Cell::new(0u32);
            let retries = Cell::new(0u32);
            let policy = RetryPolicy::new(max_attempts, Duration::from_secs(2));
            let start = Instant::now();

            let result: Result<Succeeded<()>, Exhausted<String>> = run_with_retry(
                policy,
                |attempt| {
                    calls.set(calls.get() + 1);
                    async move { Err(format!("attempt {attempt} refused")) }
                },
                |_, _| retries.set(retries.get() + 1),
            )
            .await;

            let exhausted = result.unwrap_err();
            assert_eq!(exhausted.attempts, max_attempts);
            assert_eq!(exhausted.error, format!("attempt {max_attempts} refused"));
            assert_eq!(calls.get(), max_attempts);
            assert_eq!(retries.get(), max_attempts - 1);
            // N 次尝试之间恰好 N-1 次退避
            assert_eq!(start.elapsed(), Duration::from_secs(2) * (max_attempts - 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_success() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        let start = Instant::now();

        let result = run_with_retry(
            policy,
            |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err("refused")
                    } else {
                        Ok(attempt * 10)
                    }
                }
            },
            |_, _| {},
        )
        .await;

        let succeeded = result.unwrap();
        assert_eq!(succeeded.attempt, 3);
        assert_eq!(succeeded.value, 30);
        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_never_sleeps() {
        let start = Instant::now();
        let result = run_with_retry(
            RetryPolicy::new(3, Duration::from_secs(2)),
            |_| async { Ok::<_, ()>("ok") },
            |_, _| panic!("no retry expected"),
        )
        .await;

        assert_eq!(result.unwrap().attempt, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_policy_enforces_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }
}
