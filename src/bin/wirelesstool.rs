//! Scan for Wi-Fi networks and print each one as it is found.
//!
//! Usage: `wirelesstool [seconds]`

use std::{
    env,
    error::Error,
    process,
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, error};
use wlan::{
    linux::{LinuxWlanManager, WirelessExtensions},
    wlan::WlanManager,
};

const DEFAULT_DURATION: u64 = 30;

fn run() -> Result<(), Box<dyn Error>> {
    let seconds = match env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .map_err(|e| format!("invalid duration {:?}: {}", arg, e))?,
        None => DEFAULT_DURATION,
    };

    let manager = Arc::new(LinuxWlanManager::new()?);
    let interface = manager.interface()?.ok_or("no wireless interface found")?;
    println!("Interface: {}", interface);

    match WirelessExtensions::new() {
        Ok(wext) => {
            if let Ok(name) = wext.name(&interface) {
                println!("Wireless Extension Name: {}", name);
            }
            if let Ok(version) = wext.version(&interface) {
                println!("Wireless Extension Version: {}", version);
            }
        }
        Err(e) => debug!("Wireless extensions unavailable: {}", e),
    }

    println!("Scanning for {} seconds", seconds);
    let stream = manager.scan_stream(None, &interface);
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut count = 0;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match stream.recv_timeout(remaining) {
            Some(Ok(network)) => {
                count += 1;
                println!("{}. {}", count, network);
            }
            Some(Err(e)) => return Err(e.into()),
            None if stream.is_finished() => break,
            None => (),
        }
    }
    stream.stop();
    println!("Found {} networks", count);
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}
