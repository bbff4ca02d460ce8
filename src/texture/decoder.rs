use super::cache::Texture;
use crate::{GlobeError, Result};

/// Turns a fetched payload into a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDecoder {
    /// Any format the `image` crate recognises, converted to RGBA8.
    #[cfg(feature = "image-decode")]
    Image,
    /// Raw RGBA8 pixels of a fixed size.
    Rgba { width: u32, height: u32 },
    /// Keeps the payload as-is with zero dimensions.
    Passthrough,
}

impl Default for TextureDecoder {
    fn default() -> Self {
        #[cfg(feature = "image-decode")]
        {
            Self::Image
        }
        #[cfg(not(feature = "image-decode"))]
        {
            Self::Passthrough
        }
    }
}

impl TextureDecoder {
    pub fn decode(&self, bytes: &[u8], loaded_at: u64) -> Result<Texture> {
        if bytes.is_empty() {
            return Err(GlobeError::Decode("empty payload".to_string()));
        }

        match *self {
            #[cfg(feature = "image-decode")]
            Self::Image => {
                let image = image::load_from_memory(bytes)
                    .map_err(|e| GlobeError::Decode(e.to_string()))?
                    .to_rgba8();
                let (width, height) = image.dimensions();
                Ok(Texture::new(width, height, image.into_raw(), loaded_at))
            }
            Self::Rgba { width, height } => {
                let expected = width as usize * height as usize * 4;
                if bytes.len() != expected {
                    return Err(GlobeError::Decode(format!(
                        "expected {expected} bytes of RGBA for {width}x{height}, got {}",
                        bytes.len()
                    )));
                }
                Ok(Texture::new(width, height, bytes.to_vec(), loaded_at))
            }
            Self::Passthrough => Ok(Texture::new(0, 0, bytes.to_vec(), loaded_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_size_is_checked() {
        let decoder = TextureDecoder::Rgba {
            width: 2,
            height: 1,
        };
        let texture = decoder.decode(&[0; 8], 5).unwrap();
        assert_eq!((texture.width, texture.height, texture.loaded_at), (2, 1, 5));
        assert!(matches!(
            decoder.decode(&[0; 7], 5),
            Err(GlobeError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(TextureDecoder::Passthrough.decode(&[], 0).is_err());
        assert_eq!(
            TextureDecoder::Passthrough.decode(&[1, 2], 0).unwrap().data,
            vec![1, 2]
        );
    }

    #[cfg(feature = "image-decode")]
    #[test]
    fn test_image_decoding() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageOutputFormat::Png,
            )
            .unwrap();

        let texture = TextureDecoder::Image.decode(&png, 0).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(&texture.data[..4], &[10, 20, 30, 255]);

        assert!(matches!(
            TextureDecoder::Image.decode(b"not an image", 0),
            Err(GlobeError::Decode(_))
        ));
    }
}
