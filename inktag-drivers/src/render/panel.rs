//! Panel renderer
//!
//! Streams a completed image from flash into an e-paper controller, one
//! chunk at a time through a stack buffer. Frame bytes go to the panel
//! unchanged: row-major, 8 pixels per byte, MSB leftmost, `1` = white.

use inktag_core::traits::{CompletedImage, EpdPanel, RenderError, Renderer};
use inktag_hal::SerialFlash;
use inktag_protocol::CHUNK_SIZE;

/// [`Renderer`] that draws on an [`EpdPanel`]
pub struct PanelRenderer<P> {
    panel: P,
    frames: u32,
}

impl<P: EpdPanel> PanelRenderer<P> {
    pub fn new(panel: P) -> Self {
        Self { panel, frames: 0 }
    }

    /// Number of frames pushed to the panel since boot
    pub fn frames_drawn(&self) -> u32 {
        self.frames
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn release(self) -> P {
        self.panel
    }

    fn draw<F: SerialFlash>(
        &mut self,
        flash: &mut F,
        image: &CompletedImage,
    ) -> Result<(), RenderError> {
        self.panel.reset()?;
        self.panel.init()?;
        self.panel.draw_start();

        let mut buf = [0u8; CHUNK_SIZE];
        let mut addr = image.payload.start;
        while addr < image.payload.end {
            let len = ((image.payload.end - addr) as usize).min(CHUNK_SIZE);
            flash
                .read(addr, &mut buf[..len])
                .map_err(|_| RenderError::Flash)?;
            for &byte in &buf[..len] {
                self.panel.data(byte);
            }
            addr += len as u32;
        }

        self.panel.display()
    }
}

impl<P: EpdPanel> Renderer for PanelRenderer<P> {
    fn render<F: SerialFlash>(
        &mut self,
        flash: &mut F,
        image: &CompletedImage,
    ) -> Result<(), RenderError> {
        if image.len() != self.panel.frame_len() {
            return Err(RenderError::SizeMismatch);
        }

        self.panel.setup();
        let result = self.draw(flash, image);
        // Power the panel down even after a failed refresh
        self.panel.shutdown();

        if result.is_ok() {
            self.frames += 1;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inktag_hal::mock::MemFlash;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Setup,
        Reset,
        Init,
        DrawStart,
        Display,
        Shutdown,
    }

    #[derive(Default)]
    struct MockPanel {
        calls: Vec<Call>,
        data: Vec<u8>,
        stuck_busy: bool,
    }

    impl EpdPanel for MockPanel {
        fn setup(&mut self) {
            self.calls.push(Call::Setup);
        }

        fn reset(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Reset);
            if self.stuck_busy {
                return Err(RenderError::PanelTimeout);
            }
            Ok(())
        }

        fn init(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Init);
            Ok(())
        }

        fn draw_start(&mut self) {
            self.calls.push(Call::DrawStart);
        }

        fn data(&mut self, byte: u8) {
            self.data.push(byte);
        }

        fn display(&mut self) -> Result<(), RenderError> {
            self.calls.push(Call::Display);
            Ok(())
        }

        fn shutdown(&mut self) {
            self.calls.push(Call::Shutdown);
        }

        fn frame_len(&self) -> u32 {
            100
        }
    }

    fn flash_with_image() -> MemFlash<4096> {
        let mut flash = MemFlash::new();
        let image: Vec<u8> = (0..100).collect();
        flash.write(32, &image).unwrap();
        flash
    }

    fn image() -> CompletedImage {
        CompletedImage {
            image_id: 1,
            payload: 32..132,
        }
    }

    #[test]
    fn test_streams_whole_payload_in_order() {
        let mut flash = flash_with_image();
        let mut renderer = PanelRenderer::new(MockPanel::default());

        assert_eq!(renderer.render(&mut flash, &image()), Ok(()));
        assert_eq!(renderer.frames_drawn(), 1);

        let panel = renderer.release();
        let expected: Vec<u8> = (0..100).collect();
        assert_eq!(panel.data, expected);
        assert_eq!(
            panel.calls,
            vec![
                Call::Setup,
                Call::Reset,
                Call::Init,
                Call::DrawStart,
                Call::Display,
                Call::Shutdown
            ]
        );
    }

    #[test]
    fn test_size_mismatch_leaves_panel_alone() {
        let mut flash = flash_with_image();
        let mut renderer = PanelRenderer::new(MockPanel::default());
        let short = CompletedImage {
            image_id: 1,
            payload: 32..96,
        };
        assert_eq!(
            renderer.render(&mut flash, &short),
            Err(RenderError::SizeMismatch)
        );
        assert!(renderer.panel().calls.is_empty());
    }

    #[test]
    fn test_panel_failure_still_shuts_down() {
        let mut flash = flash_with_image();
        let mut renderer = PanelRenderer::new(MockPanel {
            stuck_busy: true,
            ..MockPanel::default()
        });
        assert_eq!(
            renderer.render(&mut flash, &image()),
            Err(RenderError::PanelTimeout)
        );
        assert_eq!(renderer.panel().calls.last(), Some(&Call::Shutdown));
        assert_eq!(renderer.frames_drawn(), 0);
    }

    #[test]
    fn test_unreadable_flash() {
        let mut flash = MemFlash::<64>::new();
        let mut renderer = PanelRenderer::new(MockPanel::default());
        assert_eq!(
            renderer.render(&mut flash, &image()),
            Err(RenderError::Flash)
        );
        assert_eq!(renderer.panel().calls.last(), Some(&Call::Shutdown));
    }
}
