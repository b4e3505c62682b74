//! Scan pipeline
//!
//! Drives OCR -> MRZ block detection -> zone geometry -> crop -> OCR of the
//! crop -> decode. Only block discovery is retried: the photo is tried
//! upright, then turned by 90°, 180° and 270°, one attempt at a time.

use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::error::{MrzError, Result};
use crate::geometry::{calculate_zone, Rect, Size, Transform};
use crate::mrz::{MrzParser, PassportInformation};
use crate::vision::{
    apply_grayscale, find_mrz_block, ImageTransform, MrzTextBlockInfo, RasterTransform, TextBlock,
    TextRecognizer,
};

/// Orientations tried while looking for the MRZ, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> f32 {
        match self {
            Rotation::Deg0 => 0.0,
            Rotation::Deg90 => 90.0,
            Rotation::Deg180 => 180.0,
            Rotation::Deg270 => 270.0,
        }
    }

    /// Next rotation to try, `None` after the last one
    pub fn next(self) -> Option<Rotation> {
        match self {
            Rotation::Deg0 => Some(Rotation::Deg90),
            Rotation::Deg90 => Some(Rotation::Deg180),
            Rotation::Deg180 => Some(Rotation::Deg270),
            Rotation::Deg270 => None,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// MRZ located in a photo
#[derive(Debug, Clone)]
pub struct MrzRegion {
    /// Rotation of the photo at which the block was found
    pub rotation: Rotation,
    /// Block reported by OCR on the rotated photo
    pub block: MrzTextBlockInfo,
    /// Crop rectangle on the leveled image
    pub zone: Rect,
    /// Cropped MRZ pixels
    pub image: RgbaImage,
}

/// Block discovery state
#[derive(Debug)]
enum ScanState {
    Searching(Rotation),
    Found(MrzRegion),
    Exhausted,
}

/// Passport MRZ scanner over an OCR backend and a raster backend
pub struct Scanner<R, T = RasterTransform> {
    recognizer: Arc<R>,
    transform: Arc<T>,
    config: ScannerConfig,
}

impl<R, T> Clone for Scanner<R, T> {
    fn clone(&self) -> Self {
        Self {
            recognizer: Arc::clone(&self.recognizer),
            transform: Arc::clone(&self.transform),
            config: self.config.clone(),
        }
    }
}

impl<R> Scanner<R, RasterTransform>
where
    R: TextRecognizer + 'static,
{
    /// Create a scanner using the built-in raster backend and default configuration
    pub fn new(recognizer: R) -> Self {
        Self::with_transform(recognizer, RasterTransform::default())
    }
}

impl<R, T> Scanner<R, T>
where
    R: TextRecognizer + 'static,
    T: ImageTransform + 'static,
{
    /// Create a scanner with a custom raster backend
    pub fn with_transform(recognizer: R, transform: T) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            transform: Arc::new(transform),
            config: ScannerConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Read the passport data from a photo
    pub async fn scan(&self, image: RgbaImage) -> Result<PassportInformation> {
        let region = self.find_block(image).await?;

        let blocks = self.recognize(&region.image).await?;
        let text = blocks
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        debug!("MRZ crop read as {:?}", text);

        let parser = MrzParser::parse(&text)?;
        if self.config.scan.require_valid_checksums {
            if let Some(check) = parser.validate().failed {
                warn!("Rejecting MRZ: {} does not match", check);
                return Err(MrzError::InvalidChecksum(check));
            }
        }

        info!("MRZ decoded at {}", region.rotation);
        Ok(parser.into_passport())
    }

    /// [`Scanner::scan`] that gives up as soon as `token` is cancelled
    pub async fn scan_until_cancelled(
        &self,
        image: RgbaImage,
        token: &CancellationToken,
    ) -> Result<PassportInformation> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Scan cancelled");
                Err(MrzError::Cancelled)
            }
            result = self.scan(image) => result,
        }
    }

    /// Run [`Scanner::scan`] as a runtime task; the handle delivers the result
    pub fn spawn_scan(&self, image: RgbaImage) -> JoinHandle<Result<PassportInformation>> {
        let scanner = self.clone();
        tokio::spawn(async move { scanner.scan(image).await })
    }

    /// Locate and crop the MRZ, trying each rotation in turn
    pub async fn find_block(&self, image: RgbaImage) -> Result<MrzRegion> {
        let source = Arc::new(image);
        let mut attempts = 0;
        let mut state = ScanState::Searching(Rotation::Deg0);

        loop {
            state = match state {
                ScanState::Searching(rotation) => {
                    attempts += 1;
                    match self.attempt(&source, rotation).await {
                        Ok(region) => ScanState::Found(region),
                        Err(err) if err.is_retryable() => {
                            debug!("No MRZ at {}: {}", rotation, err);
                            rotation.next().map_or(ScanState::Exhausted, ScanState::Searching)
                        }
                        Err(err) => return Err(err),
                    }
                }
                ScanState::Found(region) => {
                    info!("MRZ block found at {} (zone {:?})", region.rotation, region.zone);
                    return Ok(region);
                }
                ScanState::Exhausted => {
                    warn!("No MRZ block found after {} attempts", attempts);
                    return Err(MrzError::NoMrzDetected { attempts });
                }
            };
        }
    }

    /// One discovery attempt at a fixed rotation
    async fn attempt(&self, source: &Arc<RgbaImage>, rotation: Rotation) -> Result<MrzRegion> {
        let image = match rotation {
            Rotation::Deg0 => Arc::clone(source),
            _ => Arc::new(self.rotate(Arc::clone(source), rotation.degrees()).await?),
        };

        let blocks = self.recognize(&image).await?;
        let block = find_mrz_block(&blocks)?;
        debug!("MRZ block at {} tilted {:.1}°: {:?}", rotation, block.angle, block.corners);

        let (zone, cropped) = self.crop_block(image, &block).await?;
        Ok(MrzRegion {
            rotation,
            block,
            zone,
            image: cropped,
        })
    }

    /// Level the image on the block's angle and cut out the MRZ zone
    async fn crop_block(
        &self,
        image: Arc<RgbaImage>,
        block: &MrzTextBlockInfo,
    ) -> Result<(Rect, RgbaImage)> {
        let transform = Arc::clone(&self.transform);
        let params = self.config.zone;
        let grayscale = self.config.scan.grayscale_crop;
        let block = block.clone();

        tokio::task::spawn_blocking(move || {
            let source = Size::from(image.dimensions());
            let leveled = transform.rotate(&image, block.angle);
            let rotated = Size::from(leveled.dimensions());

            let rotation = Transform::rotation_about_center(block.angle, source);
            let zone =
                calculate_zone(&rotation, source, rotated, &block.corners, &block.text, &params);
            if zone.is_empty() {
                return Err(MrzError::DegenerateGeometry(format!(
                    "empty MRZ zone {:?} in {}x{} image",
                    zone, rotated.width, rotated.height
                )));
            }

            let mut cropped = transform.crop(&leveled, zone);
            if grayscale {
                apply_grayscale(&mut cropped);
            }
            Ok((zone, cropped))
        })
        .await?
    }

    async fn rotate(&self, image: Arc<RgbaImage>, degrees: f32) -> Result<RgbaImage> {
        let transform = Arc::clone(&self.transform);
        Ok(tokio::task::spawn_blocking(move || transform.rotate(&image, degrees)).await?)
    }

    async fn recognize(&self, image: &RgbaImage) -> Result<Vec<TextBlock>> {
        self.recognizer.recognize(image).await.map_err(MrzError::ocr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use async_trait::async_trait;
    use image::Rgba;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const TOP: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    const BOTTOM: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    type Reply = anyhow::Result<Vec<TextBlock>>;

    /// OCR stub replaying canned replies and recording what it was shown
    #[derive(Clone, Default)]
    struct ScriptedRecognizer {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        seen: Arc<Mutex<Vec<RgbaImage>>>,
    }

    impl ScriptedRecognizer {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                seen: Arc::default(),
            }
        }

        fn seen_dimensions(&self) -> Vec<(u32, u32)> {
            self.seen.lock().unwrap().iter().map(|i| i.dimensions()).collect()
        }
    }

    #[async_trait]
    impl TextRecognizer for ScriptedRecognizer {
        async fn recognize(&self, image: &RgbaImage) -> anyhow::Result<Vec<TextBlock>> {
            self.seen.lock().unwrap().push(image.clone());
            self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
        }
    }

    /// Raster backend that logs every rotation it performs
    #[derive(Clone, Default)]
    struct RecordingTransform {
        rotations: Arc<Mutex<Vec<f32>>>,
    }

    impl ImageTransform for RecordingTransform {
        fn rotate(&self, image: &RgbaImage, degrees: f32) -> RgbaImage {
            self.rotations.lock().unwrap().push(degrees);
            RasterTransform::nearest().rotate(image, degrees)
        }

        fn crop(&self, image: &RgbaImage, rect: Rect) -> RgbaImage {
            RasterTransform::nearest().crop(image, rect)
        }
    }

    fn photo() -> RgbaImage {
        RgbaImage::from_pixel(40, 20, Rgba([200, 40, 40, 255]))
    }

    fn quad(left: i32, top: i32, right: i32, bottom: i32) -> [Point; 4] {
        [
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ]
    }

    /// MRZ block inside the 20x40 canvas of the photo turned by 90° or 270°
    fn mrz_block() -> TextBlock {
        TextBlock::new(format!("{TOP}\n{BOTTOM}"), quad(1, 30, 19, 33))
    }

    fn crop_reading(bottom: &str) -> Reply {
        Ok(vec![
            TextBlock::new(TOP, quad(0, 0, 14, 2)),
            TextBlock::new(bottom, quad(0, 2, 14, 4)),
        ])
    }

    fn scanner(
        recognizer: &ScriptedRecognizer,
        transform: &RecordingTransform,
    ) -> Scanner<ScriptedRecognizer, RecordingTransform> {
        Scanner::with_transform(recognizer.clone(), transform.clone())
    }

    #[test]
    fn test_rotation_order() {
        let mut order = vec![Rotation::Deg0];
        while let Some(next) = order.last().unwrap().next() {
            order.push(next);
        }
        assert_eq!(order, Rotation::ALL);
        assert_eq!(Rotation::Deg270.to_string(), "270°");
    }

    #[tokio::test]
    async fn test_found_on_fourth_rotation() {
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(vec![]),
            Ok(vec![]),
            Ok(vec![]),
            Ok(vec![mrz_block()]),
            crop_reading(BOTTOM),
        ]);
        let transform = RecordingTransform::default();

        let passport = scanner(&recognizer, &transform).scan(photo()).await.unwrap();

        assert_eq!(passport.document_number, "L898902C3");
        assert_eq!(passport.first_name, "Anna Maria");
        assert_eq!(passport.last_name, "Eriksson");
        assert_eq!(passport.sex, "F");
        assert_eq!(passport.date_of_birth, "740812");
        assert_eq!(passport.expiration_date, "120415");

        // Three search turns, then leveling the block (already straight)
        assert_eq!(*transform.rotations.lock().unwrap(), vec![90.0, 180.0, 270.0, 0.0]);
        assert_eq!(
            recognizer.seen_dimensions(),
            vec![(40, 20), (20, 40), (40, 20), (20, 40), (14, 4)]
        );
    }

    #[tokio::test]
    async fn test_find_block_reports_region() {
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(vec![TextBlock::new("PASSPORT", quad(0, 0, 9, 3))]),
            Ok(vec![mrz_block()]),
        ]);
        let transform = RecordingTransform::default();

        let region = scanner(&recognizer, &transform).find_block(photo()).await.unwrap();

        assert_eq!(region.rotation, Rotation::Deg90);
        assert_eq!(region.block.text, mrz_block().text);
        assert!(region.block.angle.abs() < 1e-3);
        assert_eq!(region.zone, Rect::new(0, 27, 14, 31));
        assert_eq!(region.image.dimensions(), (14, 4));
    }

    #[tokio::test]
    async fn test_ocr_failures_are_retried() {
        let recognizer = ScriptedRecognizer::new(vec![
            Err(anyhow::anyhow!("camera shake")),
            Ok(vec![mrz_block()]),
            crop_reading(BOTTOM),
        ]);
        let transform = RecordingTransform::default();

        let passport = scanner(&recognizer, &transform).scan(photo()).await.unwrap();
        assert_eq!(passport.nationality, "UTO");
    }

    #[tokio::test]
    async fn test_exhausted_after_four_rotations() {
        let recognizer = ScriptedRecognizer::new(vec![]);
        let transform = RecordingTransform::default();

        let err = scanner(&recognizer, &transform).scan(photo()).await.unwrap_err();

        assert!(matches!(err, MrzError::NoMrzDetected { attempts: 4 }));
        assert_eq!(*transform.rotations.lock().unwrap(), vec![90.0, 180.0, 270.0]);
        assert_eq!(recognizer.seen_dimensions().len(), 4);
    }

    #[tokio::test]
    async fn test_crop_stage_failure_is_not_retried() {
        let upright_block = TextBlock::new(format!("{TOP}\n{BOTTOM}"), quad(1, 10, 39, 13));
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(vec![upright_block]),
            Err(anyhow::anyhow!("engine crashed")),
        ]);
        let transform = RecordingTransform::default();

        let err = scanner(&recognizer, &transform).scan(photo()).await.unwrap_err();

        assert!(matches!(err, MrzError::OcrFailure(_)));
        assert_eq!(*transform.rotations.lock().unwrap(), vec![0.0]);
        assert_eq!(recognizer.seen_dimensions().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_checksum_rejected() {
        let tampered = BOTTOM.replacen("740812", "740813", 1);
        let replies = || vec![Ok(vec![]), Ok(vec![mrz_block()]), crop_reading(&tampered)];

        let recognizer = ScriptedRecognizer::new(replies());
        let err = scanner(&recognizer, &RecordingTransform::default())
            .scan(photo())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MrzError::InvalidChecksum(crate::mrz::ValidationCheck::BirthDateChecksum)
        ));

        let mut config = ScannerConfig::default();
        config.scan.require_valid_checksums = false;
        let recognizer = ScriptedRecognizer::new(replies());
        let passport = scanner(&recognizer, &RecordingTransform::default())
            .with_config(config)
            .scan(photo())
            .await
            .unwrap();
        assert_eq!(passport.date_of_birth, "740813");
    }

    #[tokio::test]
    async fn test_grayscale_crop() {
        let mut config = ScannerConfig::default();
        config.scan.grayscale_crop = true;
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(vec![]),
            Ok(vec![mrz_block()]),
            crop_reading(BOTTOM),
        ]);

        scanner(&recognizer, &RecordingTransform::default())
            .with_config(config)
            .scan(photo())
            .await
            .unwrap();

        let seen = recognizer.seen.lock().unwrap();
        let crop = seen.last().unwrap();
        assert!(crop.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
        // The search passes still saw the colour photo
        assert_ne!(seen[0].get_pixel(0, 0).0[0], seen[0].get_pixel(0, 0).0[1]);
    }

    #[tokio::test]
    async fn test_cancelled_scan() {
        let recognizer = ScriptedRecognizer::new(vec![Ok(vec![mrz_block()])]);
        let token = CancellationToken::new();
        token.cancel();

        let err = scanner(&recognizer, &RecordingTransform::default())
            .scan_until_cancelled(photo(), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, MrzError::Cancelled));
        assert!(recognizer.seen_dimensions().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_scan() {
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(vec![]),
            Ok(vec![mrz_block()]),
            crop_reading(BOTTOM),
        ]);
        let handle = scanner(&recognizer, &RecordingTransform::default()).spawn_scan(photo());

        let passport = handle.await.unwrap().unwrap();
        assert_eq!(passport.document_code, "P");
    }
}
