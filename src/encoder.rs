use base64::Engine;
use bytes::Bytes;

/// Screenshot formats accepted by the upload filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Accepts `png`, `jpg` and `jpeg` extensions, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// One uploaded screenshot. `position` is 1-based and follows upload order.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub position: usize,
    pub file_name: String,
    pub kind: ImageKind,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImageReference {
    pub step: usize,
    pub file_name: String,
    pub reference: String,
}

impl EncodedImageReference {
    pub fn caption(&self) -> String {
        format!("Step {}: {}", self.step, self.file_name)
    }
}

pub fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl UploadedImage {
    pub fn new(position: usize, file_name: impl Into<String>, kind: ImageKind, bytes: impl Into<Bytes>) -> Self {
        Self { position, file_name: file_name.into(), kind, bytes: bytes.into() }
    }

    pub fn encode(&self) -> EncodedImageReference {
        let step = self.position;
        let payload = encode_image(&self.bytes);
        EncodedImageReference {
            step,
            file_name: self.file_name.clone(),
            reference: format!(
                "Step {step}: ![Screenshot {step}](data:{};base64,{payload})",
                self.kind.mime_type()
            ),
        }
    }
}

pub fn encode_all(images: &[UploadedImage]) -> Vec<EncodedImageReference> {
    images.iter().map(UploadedImage::encode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(s: &str) -> Vec<u8> {
        base64::engine::general_purpose::STANDARD.decode(s).unwrap()
    }

    #[test]
    fn encoding_round_trips_arbitrary_bytes() {
        let samples: [&[u8]; 4] = [b"", b"\x89PNG\r\n\x1a\n", &[0u8, 255, 128, 7, 0], b"hello world"];
        for sample in samples {
            assert_eq!(decode(&encode_image(sample)), sample.to_vec());
        }
        let all_bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&encode_image(&all_bytes)), all_bytes);
    }

    #[test]
    fn empty_input_encodes_to_empty_string() {
        assert_eq!(encode_image(&[]), "");
    }

    #[test]
    fn reference_uses_step_label_and_data_uri() {
        let img = UploadedImage::new(2, "stepB.png", ImageKind::Png, &b"abc"[..]);
        let encoded = img.encode();
        assert_eq!(encoded.step, 2);
        assert_eq!(encoded.reference, "Step 2: ![Screenshot 2](data:image/png;base64,YWJj)");
        assert_eq!(encoded.caption(), "Step 2: stepB.png");
    }

    #[test]
    fn jpeg_references_use_jpeg_mime() {
        let img = UploadedImage::new(1, "shot.JPG", ImageKind::Jpeg, &b"x"[..]);
        assert!(img.encode().reference.contains("data:image/jpeg;base64,eA=="));
    }

    #[test]
    fn encode_all_preserves_upload_order() {
        let images = vec![
            UploadedImage::new(1, "a.png", ImageKind::Png, &b"1"[..]),
            UploadedImage::new(2, "b.jpg", ImageKind::Jpeg, &b"2"[..]),
            UploadedImage::new(3, "c.jpeg", ImageKind::Jpeg, &b"3"[..]),
        ];
        let steps: Vec<_> = encode_all(&images).into_iter().map(|r| (r.step, r.file_name)).collect();
        assert_eq!(
            steps,
            vec![(1, "a.png".to_string()), (2, "b.jpg".to_string()), (3, "c.jpeg".to_string())]
        );
    }

    #[test]
    fn kind_detection_by_extension() {
        assert_eq!(ImageKind::from_file_name("login.png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_file_name("LOGIN.PNG"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_file_name("a.b.jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("photo.Jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("anim.gif"), None);
        assert_eq!(ImageKind::from_file_name("png"), None);
        assert_eq!(ImageKind::from_file_name(""), None);
    }
}
