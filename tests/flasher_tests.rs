use std::io::Write;
use std::sync::{Arc, Mutex};

use flashterm::core::flasher::{image_checksum, SimFlasherFactory, SimStep};
use flashterm::core::log::LogKind;
use flashterm::core::session::{SessionController, SessionPhase};
use flashterm::domain::config::{FirmwareEntry, FirmwareSource};
use flashterm::domain::error::FlashTermError;
use tempfile::NamedTempFile;

/// End-to-end programming passes against the simulated backend
#[cfg(test)]
mod flasher_tests {
    use super::*;

    fn create_test_firmware(content: &[u8]) -> (NamedTempFile, FirmwareEntry) {
        let mut file = NamedTempFile::new().expect("Failed to create firmware file");
        file.write_all(content).expect("Failed to write firmware file");
        let entry = FirmwareEntry {
            name: "app".to_string(),
            description: "Test image".to_string(),
            source: FirmwareSource::Path {
                path: file.path().to_path_buf(),
            },
        };
        (file, entry)
    }

    async fn create_connected(factory: SimFlasherFactory) -> (SessionController, NamedTempFile) {
        let controller = SessionController::new(Arc::new(factory), 200);
        let port = NamedTempFile::new().expect("Failed to create port file");
        controller
            .connect(&port.path().to_string_lossy())
            .await
            .expect("Failed to connect");
        (controller, port)
    }

    #[tokio::test]
    async fn test_programming_pass_fills_storage() {
        let factory = SimFlasherFactory::new();
        let storage = factory.storage();
        let (controller, _port) = create_connected(factory).await;

        let image: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
        let (_file, firmware) = create_test_firmware(&image);

        controller.program(&firmware, None).await.expect("Programming failed");

        assert_eq!(*storage.lock().unwrap(), image);
        assert_eq!(controller.phase().await, SessionPhase::Connected);
    }

    #[tokio::test]
    async fn test_log_reports_stages_in_order() {
        let (controller, _port) = create_connected(SimFlasherFactory::new()).await;
        let (_file, firmware) = create_test_firmware(&[0xAB; 6000]);

        controller.program(&firmware, None).await.expect("Programming failed");

        let entries = controller.log().snapshot();
        let position = |prefix: &str| {
            entries
                .iter()
                .position(|e| e.text.starts_with(prefix))
                .unwrap_or_else(|| panic!("No '{}' line in the log", prefix))
        };

        let erase = position("Erasing flash (this may take a while)");
        let fetch = position("Fetching firmware:");
        let write = position("Writing at");
        let verified = position("Hash of data verified.");
        let finished = position("Programming finished in");

        assert!(erase < fetch, "erase must come before the image fetch");
        assert!(fetch < write, "the image fetch must come before the write");
        assert!(write < verified);
        assert!(verified < finished);
    }

    #[tokio::test]
    async fn test_write_progress_collapses_into_one_entry() {
        let (controller, _port) = create_connected(SimFlasherFactory::new()).await;
        let (_file, firmware) = create_test_firmware(&[0x5A; 20_000]);

        controller.program(&firmware, None).await.expect("Programming failed");

        let entries = controller.log().snapshot();
        let writing: Vec<_> = entries
            .iter()
            .filter(|e| e.text.starts_with("Writing at"))
            .collect();
        assert_eq!(writing.len(), 1);
        assert_eq!(writing[0].kind, LogKind::Progress);
        assert!(writing[0].text.ends_with("(100 %)"));
    }

    #[tokio::test]
    async fn test_progress_callback_reaches_total() {
        let (controller, _port) = create_connected(SimFlasherFactory::new()).await;
        let image = vec![0x11; 9000];
        let (_file, firmware) = create_test_firmware(&image);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        controller
            .program(
                &firmware,
                Some(Box::new(move |written, total| {
                    recorded.lock().unwrap().push((written, total));
                })),
            )
            .await
            .expect("Programming failed");

        let calls = calls.lock().unwrap();
        assert!(!calls.is_empty());
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(calls.last().unwrap(), &(9000, 9000));
    }

    #[tokio::test]
    async fn test_checksum_line_matches_image() {
        let (controller, _port) = create_connected(SimFlasherFactory::new()).await;
        let image = vec![0x0F, 0xF0, 0x33];
        let (_file, firmware) = create_test_firmware(&image);

        controller.program(&firmware, None).await.expect("Programming failed");

        let expected = format!("checksum 0x{:02x}", image_checksum(&image));
        let entries = controller.log().snapshot();
        assert!(entries.iter().any(|e| e.text.contains(&expected)));
    }

    #[tokio::test]
    async fn test_release_failure_surfaces_after_successful_write() {
        let factory = SimFlasherFactory::failing_at(SimStep::Release);
        let storage = factory.storage();
        let (controller, _port) = create_connected(factory).await;
        let image = vec![0xC3; 500];
        let (_file, firmware) = create_test_firmware(&image);

        let result = controller.program(&firmware, None).await;
        assert!(matches!(result, Err(FlashTermError::Flasher(_))));

        // The write itself went through before the reset failed
        assert_eq!(*storage.lock().unwrap(), image);
        assert_eq!(controller.phase().await, SessionPhase::Connected);
    }

    #[tokio::test]
    async fn test_failed_write_reports_error_and_recovers() {
        let factory = SimFlasherFactory::failing_at(SimStep::Write);
        let (controller, _port) = create_connected(factory).await;
        let (_file, firmware) = create_test_firmware(&[1, 2, 3]);

        assert!(controller.program(&firmware, None).await.is_err());

        let entries = controller.log().snapshot();
        assert!(entries
            .iter()
            .any(|e| e.kind == LogKind::Error && e.text.starts_with("Programming failed:")));

        // A second pass through the same session works once the fault is gone
        assert_eq!(controller.phase().await, SessionPhase::Connected);
    }
}
