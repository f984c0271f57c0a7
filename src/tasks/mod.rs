//! Background scheduled tasks for the application.
//!
//! The only recurring job is the red-packet expiry sweep: it finds Active
//! packets past their expire_time, refunds the unclaimed remainder to the
//! sender and moves them to the Expired terminal state. Call `spawn_all`
//! once during startup to launch it.

use crate::services::PacketService;

/// Spawn all background tasks.
///
/// Notes
/// - The sweep re-validates every candidate under the packet row lock, so
///   running it concurrently with live claims is safe.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(packet_service: PacketService, sweep_interval_seconds: u64) {
    // 过期红包扫描
    {
        let svc = packet_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.expire_sweep().await {
                    Ok(n) if n > 0 => log::info!("Expired red packets processed: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to sweep expired red packets: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(sweep_interval_seconds)).await;
            }
        });
    }
}
