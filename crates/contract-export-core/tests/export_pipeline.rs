//! End-to-end tests of the export pipeline against an in-memory host.

use contract_export_core::{
    export, prepare_clone, settle_images, BreakReport, CaptureRequest, ClonedDocument,
    ExportConfig, ExportError, ExportHost, ImageLoad, ImageReadiness, RasterSnapshot,
};
use image::{Rgba, RgbaImage};
use lopdf::Document;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

enum RasterBehavior {
    Capture { width: u32, height: u32 },
    Fail,
}

struct FakeHost {
    elements: RefCell<BTreeMap<String, String>>,
    events: RefCell<Vec<String>>,
    /// (delay in ms, outcome) per image under the root element
    images: Vec<(u64, ImageLoad)>,
    fonts_hang: bool,
    raster: RasterBehavior,
    identifier: Option<String>,
    sections: usize,
    signature_top: Option<f64>,
    breaks: RefCell<Option<BreakReport>>,
    delivered: RefCell<Option<(String, Vec<u8>)>>,
    notices: RefCell<Vec<String>>,
}

impl FakeHost {
    fn new(raster: RasterBehavior) -> Self {
        Self {
            elements: RefCell::new(BTreeMap::new()),
            events: RefCell::new(Vec::new()),
            images: Vec::new(),
            fonts_hang: false,
            raster,
            identifier: None,
            sections: 0,
            signature_top: None,
            breaks: RefCell::new(None),
            delivered: RefCell::new(None),
            notices: RefCell::new(Vec::new()),
        }
    }

    fn log(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn has(&self, id: &str) -> bool {
        self.elements.borrow().contains_key(id)
    }
}

struct FakeClone<'a> {
    sections: usize,
    signature_top: Option<f64>,
    log: &'a RefCell<Vec<String>>,
}

impl ClonedDocument for FakeClone<'_> {
    fn section_count(&self) -> usize {
        self.sections
    }

    fn insert_break_after_section(&mut self, index: usize) -> Result<(), String> {
        self.log.borrow_mut().push(format!("break-after:{}", index));
        Ok(())
    }

    fn signature_top(&self) -> Option<f64> {
        self.signature_top
    }

    fn insert_break_before_signature(&mut self) -> Result<(), String> {
        self.log.borrow_mut().push("break-before-signature".into());
        Ok(())
    }
}

impl ExportHost for FakeHost {
    fn contains_element(&self, id: &str) -> bool {
        self.has(id)
    }

    fn show_busy_overlay(&self, id: &str, message: &str) -> Result<(), ExportError> {
        self.elements
            .borrow_mut()
            .insert(id.to_string(), format!("overlay:{}", message));
        self.log("overlay+");
        Ok(())
    }

    fn inject_stylesheet(&self, id: &str, css: &str) -> Result<(), ExportError> {
        assert!(css.contains(".page-break"));
        self.elements
            .borrow_mut()
            .insert(id.to_string(), "style".to_string());
        self.log("style+");
        Ok(())
    }

    fn remove_element(&self, id: &str) {
        if self.elements.borrow_mut().remove(id).is_some() {
            self.log(format!("removed:{}", id));
        }
    }

    async fn fonts_ready(&self) -> Result<(), ExportError> {
        if self.fonts_hang {
            futures::future::pending::<()>().await;
        }
        self.log("fonts");
        Ok(())
    }

    async fn images_settled(&self, _root: &str) -> Result<ImageReadiness, ExportError> {
        let pending = self.images.iter().map(|&(delay, outcome)| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            outcome
        });
        let readiness = settle_images(pending).await;
        self.log(format!("images:{}/{}", readiness.loaded, readiness.failed));
        Ok(readiness)
    }

    async fn rasterize(&self, request: CaptureRequest<'_>) -> Result<RasterSnapshot, ExportError> {
        self.log(format!(
            "rasterize overlay={} style={}",
            self.has("pdf-loading"),
            self.has("temp-print-style")
        ));
        assert_eq!(request.root_element_id, "contract-document");
        assert_eq!(request.options.scale, 2.0);

        let mut clone = FakeClone {
            sections: self.sections,
            signature_top: self.signature_top,
            log: &self.events,
        };
        let report = prepare_clone(&mut clone, request.page_breaks, request.page_format)
            .map_err(ExportError::Rasterize)?;
        *self.breaks.borrow_mut() = Some(report);

        match self.raster {
            RasterBehavior::Capture { width, height } => Ok(RasterSnapshot::new(
                RgbaImage::from_pixel(width, height, Rgba([250, 250, 250, 255])),
            )),
            RasterBehavior::Fail => Err(ExportError::Rasterize("canvas tainted".into())),
        }
    }

    fn element_text(&self, id: &str) -> Option<String> {
        assert_eq!(id, "agreement-number");
        self.identifier.clone()
    }

    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<(), ExportError> {
        self.log(format!("deliver:{}", filename));
        *self.delivered.borrow_mut() = Some((filename.to_string(), bytes));
        Ok(())
    }

    fn notify_failure(&self, message: &str) {
        self.log(format!("notice overlay={}", self.has("pdf-loading")));
        self.notices.borrow_mut().push(message.to_string());
    }
}

#[tokio::test]
async fn test_export_delivers_paginated_pdf() {
    let mut host = FakeHost::new(RasterBehavior::Capture {
        width: 42,
        height: 130,
    });
    host.identifier = Some(" AG-2024-017 ".into());

    let report = export(&host, &ExportConfig::default()).await.unwrap();

    assert_eq!(report.filename, "AG-2024-017.pdf");
    assert_eq!(report.page_count, 3);

    let (filename, bytes) = host.delivered.borrow_mut().take().unwrap();
    assert_eq!(filename, "AG-2024-017.pdf");
    assert_eq!(bytes.len(), report.byte_len);
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    assert!(host.elements.borrow().is_empty());
    assert!(host.notices.borrow().is_empty());
}

#[tokio::test]
async fn test_export_falls_back_to_default_filename() {
    let host = FakeHost::new(RasterBehavior::Capture {
        width: 10,
        height: 10,
    });
    let report = export(&host, &ExportConfig::default()).await.unwrap();
    assert_eq!(report.filename, "contract.pdf");
    assert_eq!(report.page_count, 1);
}

#[tokio::test]
async fn test_rasterizer_waits_for_all_images_including_failures() {
    let mut host = FakeHost::new(RasterBehavior::Capture {
        width: 10,
        height: 10,
    });
    host.images = vec![
        (30, ImageLoad::Loaded),
        (5, ImageLoad::Failed),
        (15, ImageLoad::Loaded),
    ];

    let report = export(&host, &ExportConfig::default()).await.unwrap();
    assert_eq!(
        report.images,
        ImageReadiness {
            loaded: 2,
            failed: 1
        }
    );

    let events = host.events();
    let position = |prefix: &str| events.iter().position(|e| e.starts_with(prefix)).unwrap();
    assert!(position("overlay+") < position("fonts"));
    assert!(position("fonts") < position("images:2/1"));
    assert!(position("images:2/1") < position("style+"));
    assert!(position("style+") < position("rasterize"));
    assert!(events.contains(&"rasterize overlay=true style=true".to_string()));
    assert!(position("removed:temp-print-style") < position("deliver:"));
}

#[tokio::test]
async fn test_rasterize_failure_clears_overlay_and_stylesheet() {
    let host = FakeHost::new(RasterBehavior::Fail);
    let config = ExportConfig::default();

    let err = export(&host, &config).await.unwrap_err();
    assert!(matches!(err, ExportError::Rasterize(_)));

    assert!(!host.has("pdf-loading"));
    assert!(!host.has("temp-print-style"));
    assert!(host.delivered.borrow().is_none());
    assert_eq!(*host.notices.borrow(), vec![config.failure_message.clone()]);
    // Overlay is gone before the user sees the notice
    assert!(host.events().contains(&"notice overlay=false".to_string()));
}

#[tokio::test]
async fn test_empty_raster_reports_failure() {
    let host = FakeHost::new(RasterBehavior::Capture {
        width: 0,
        height: 0,
    });
    let err = export(&host, &ExportConfig::default()).await.unwrap_err();
    assert!(matches!(err, ExportError::EmptyRaster { .. }));
    assert!(host.elements.borrow().is_empty());
    assert_eq!(host.notices.borrow().len(), 1);
}

#[tokio::test]
async fn test_concurrent_export_is_rejected() {
    let host = FakeHost::new(RasterBehavior::Capture {
        width: 10,
        height: 10,
    });
    host.elements
        .borrow_mut()
        .insert("pdf-loading".into(), "overlay:first call".into());

    let err = export(&host, &ExportConfig::default()).await.unwrap_err();
    assert!(matches!(err, ExportError::AlreadyInProgress(ref id) if id == "pdf-loading"));

    // The first call's overlay is left alone
    assert_eq!(
        host.elements.borrow().get("pdf-loading").map(String::as_str),
        Some("overlay:first call")
    );
    assert!(!host.events().iter().any(|e| e.starts_with("rasterize")));
}

#[tokio::test]
async fn test_dropped_export_removes_overlay() {
    let mut host = FakeHost::new(RasterBehavior::Fail);
    host.fonts_hang = true;

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        export(&host, &ExportConfig::default()),
    )
    .await;
    assert!(result.is_err());
    assert!(!host.has("pdf-loading"));
    assert!(host.notices.borrow().is_empty());
}

#[tokio::test]
async fn test_clone_hook_receives_break_rules() {
    let mut host = FakeHost::new(RasterBehavior::Capture {
        width: 10,
        height: 10,
    });
    host.sections = 8;
    host.signature_top = Some(1000.0);

    export(&host, &ExportConfig::default()).await.unwrap();

    let report = host.breaks.borrow().clone().unwrap();
    assert_eq!(report.after_sections, vec![3, 6]);
    assert!(report.before_signature);
    let events = host.events();
    assert!(events.contains(&"break-after:3".to_string()));
    assert!(events.contains(&"break-before-signature".to_string()));
}

#[tokio::test]
async fn test_invalid_config_is_reported_without_side_effects() {
    let host = FakeHost::new(RasterBehavior::Capture {
        width: 10,
        height: 10,
    });
    let config = ExportConfig {
        jpeg_quality: 0,
        ..ExportConfig::default()
    };
    let err = export(&host, &config).await.unwrap_err();
    assert!(matches!(err, ExportError::Config(_)));
    assert!(!host.events().iter().any(|e| e == "overlay+"));
    assert_eq!(host.notices.borrow().len(), 1);
}
