use std::path::PathBuf;

use tierlog::{Config, Field, errorf, infof};

fn main() {
    let dir = PathBuf::from("/tmp/tierlog_example");
    let _ = std::fs::remove_dir_all(&dir);

    let config = Config::new(dir.join("info.log"), dir.join("error.log")).with_mode("prod");
    let logger = tierlog::init(&config).expect("Unable to open log files");
    logger.info("service starting", &[Field::new("workers", 4)]);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                infof!(tierlog::logger(), "worker {i} ready");
                log::warn!("worker {i} is running on a {}-bit target", usize::BITS);
                if i == 3 {
                    let err = std::fs::read("/does/not/exist").unwrap_err();
                    errorf!(tierlog::logger(), error = err; "worker {i} could not load its state");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    tierlog::flush();

    for file in ["info.log", "error.log"] {
        let content = std::fs::read_to_string(dir.join(file)).unwrap();
        println!("\n--- {file}: {} records ---", content.lines().count());
    }
}
