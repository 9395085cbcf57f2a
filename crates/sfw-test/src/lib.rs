use std::net::{IpAddr, Ipv4Addr};

// This makes hanging tests easier to debug. Its immediately clear on which line the test has hung.
#[macro_export]
macro_rules! await_timeout {
    ($s:expr) => {
        tokio::select! {
          v = $s => { v }
          _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => {
              panic!("await took too long")
          }
        }
    };
}

/// Calculates elapsed time with defined rounding
#[macro_export]
macro_rules! assert_elapsed {
    ($start:expr, $dur:expr, $round:expr) => {{
        let elapsed = $start.elapsed();
        let lower: std::time::Duration = $dur;
        let round: std::time::Duration = $round;

        assert!(
            elapsed >= lower - round && elapsed <= lower + round,
            "actual = {:?}, expected = {:?}",
            elapsed,
            lower,
        );
    }};
}

pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
