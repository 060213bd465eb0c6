//! Sync engine
//!
//! Drives the radio through request/reply rounds and applies replies to the
//! image store. Radio failures are transient and end the round; the tick
//! cadence is the only retry mechanism.

use inktag_hal::SerialFlash;
use inktag_protocol::{DataMessage, Hello, WireError, DATA_LEN};

use crate::config::{SyncConfig, TagIdentity};
use crate::image::{ApplyOutcome, ImageStore, StoreError};
use crate::traits::{BatteryMonitor, Radio, RadioError, RenderError, Renderer};

/// Errors that abort a round (as opposed to ending it)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    /// Radio unusable or bus failure
    Radio(RadioError),
    /// Flash failure while updating the store
    Store(StoreError),
    /// Hello could not be encoded
    Wire(WireError),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}

impl From<WireError> for SyncError {
    fn from(e: WireError) -> Self {
        SyncError::Wire(e)
    }
}

/// How a single round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoundOutcome {
    /// Hello never left; nothing changed
    TransmitFailed,
    /// No reply within the receive budget
    NoReply,
    /// Reply failed CRC/FEC or was too short
    Corrupted,
    /// Gateway has nothing newer for us
    Synced,
    /// Reply offset unusable; nothing changed
    Rejected { image_id: u32, offset: u16 },
    /// New chunk stored
    ChunkStored {
        image_id: u32,
        index: u16,
        /// The reply carried a new image id and the store was reset first
        adopted: bool,
    },
    /// Chunk already held
    Duplicate { image_id: u32, index: u16 },
    /// Last missing chunk stored and the renderer was called
    ///
    /// The chunk map alone makes the image complete, so the panel is drawn
    /// even when the complete flag could not be written.
    Completed {
        image_id: u32,
        adopted: bool,
        render_error: Option<RenderError>,
        /// Complete flag write failed; retried on later rounds
        persist_error: Option<StoreError>,
    },
}

impl RoundOutcome {
    /// Check whether another round should follow on this wake
    pub fn wants_more(&self) -> bool {
        matches!(self, Self::ChunkStored { .. } | Self::Duplicate { .. })
    }
}

/// Summary of one wake's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionReport {
    pub rounds: u16,
    pub chunks_stored: u16,
    pub duplicates: u16,
    /// Id adopted during this session, if any
    pub adopted_image: Option<u32>,
    /// The image became complete during this session
    pub completed: bool,
    /// Session stopped at the round limit rather than on its own
    pub hit_round_limit: bool,
    /// Outcome of the final round
    pub last: Option<RoundOutcome>,
}

/// Tag side of the sync protocol
pub struct SyncEngine<F> {
    identity: TagIdentity,
    config: SyncConfig,
    store: ImageStore<F>,
}

impl<F: SerialFlash> SyncEngine<F> {
    pub fn new(identity: TagIdentity, config: SyncConfig, store: ImageStore<F>) -> Self {
        Self {
            identity,
            config,
            store,
        }
    }

    pub fn store(&self) -> &ImageStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ImageStore<F> {
        &mut self.store
    }

    /// Hello announcing the current state
    pub fn hello(&self, battery_mv: u16) -> Hello {
        Hello {
            tag_type: self.identity.tag_type,
            tag_id: self.identity.tag_id,
            firmware_hash: self.identity.firmware_hash,
            install_time: self.identity.install_time,
            battery_mv,
            image_id: self.store.image_id(),
            chunk_map: *self.store.chunk_map().as_bytes(),
        }
    }

    /// Render the stored image if it is complete
    ///
    /// Returns `Ok(false)` when there is nothing to draw.
    pub fn render_stored<D: Renderer>(&mut self, renderer: &mut D) -> Result<bool, RenderError> {
        match self.store.completed_image() {
            Some(image) => {
                renderer.render(self.store.flash_mut(), &image)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run one request/reply round
    pub fn run_round<R, B, D>(
        &mut self,
        radio: &mut R,
        battery: &mut B,
        renderer: &mut D,
    ) -> Result<RoundOutcome, SyncError>
    where
        R: Radio,
        B: BatteryMonitor,
        D: Renderer,
    {
        let hello = self.hello(battery.read_millivolts()).encode_to_vec()?;
        match radio.transmit(self.config.gateway, &hello) {
            Ok(()) => {}
            Err(RadioError::Timeout) => return Ok(RoundOutcome::TransmitFailed),
            Err(e) => return Err(SyncError::Radio(e)),
        }

        let mut packet = [0u8; DATA_LEN];
        let received = match radio.receive(self.identity.address(), &mut packet, self.config.rx_timeout) {
            Ok(Some(len)) => len,
            Ok(None) | Err(RadioError::Timeout) => return Ok(RoundOutcome::NoReply),
            Err(RadioError::CorruptedReceive) => return Ok(RoundOutcome::Corrupted),
            Err(e) => return Err(SyncError::Radio(e)),
        };
        let Ok(data) = DataMessage::decode(&packet[..received.min(DATA_LEN)]) else {
            return Ok(RoundOutcome::Corrupted);
        };

        if data.flags.is_synced() {
            self.store.mark_complete()?;
            return Ok(RoundOutcome::Synced);
        }

        self.apply(data, renderer)
    }

    fn apply<D: Renderer>(
        &mut self,
        data: DataMessage,
        renderer: &mut D,
    ) -> Result<RoundOutcome, SyncError> {
        let rejected = RoundOutcome::Rejected {
            image_id: data.image_id,
            offset: data.offset,
        };
        // Id 0 is "no image" locally and can't be adopted
        if data.image_id == 0 || self.store.index_for_offset(data.offset).is_none() {
            return Ok(rejected);
        }

        let adopted = data.image_id != self.store.image_id();
        if adopted {
            self.store.reset_to(data.image_id)?;
        }

        let image_id = data.image_id;
        match self.store.apply_chunk(data.offset, &data.payload)? {
            ApplyOutcome::Duplicate { index } => {
                // No-op unless an earlier flag write failed
                self.store.mark_complete()?;
                Ok(RoundOutcome::Duplicate {
                    image_id,
                    index: index.get(),
                })
            }
            ApplyOutcome::Stored {
                index,
                complete: false,
            } => Ok(RoundOutcome::ChunkStored {
                image_id,
                index: index.get(),
                adopted,
            }),
            ApplyOutcome::Stored { complete: true, .. } => {
                let persist_error = self.store.mark_complete().err();
                let render_error = self.render_stored(renderer).err();
                Ok(RoundOutcome::Completed {
                    image_id,
                    adopted,
                    render_error,
                    persist_error,
                })
            }
        }
    }

    /// Run rounds until the gateway stops feeding chunks, then sleep the radio
    ///
    /// The radio is put to sleep even when a round fails.
    pub fn run_session<R, B, D>(
        &mut self,
        radio: &mut R,
        battery: &mut B,
        renderer: &mut D,
    ) -> Result<SessionReport, SyncError>
    where
        R: Radio,
        B: BatteryMonitor,
        D: Renderer,
    {
        let result = self.session_rounds(radio, battery, renderer);
        let slept = radio.sleep();
        let report = result?;
        slept.map_err(SyncError::Radio)?;
        Ok(report)
    }

    fn session_rounds<R, B, D>(
        &mut self,
        radio: &mut R,
        battery: &mut B,
        renderer: &mut D,
    ) -> Result<SessionReport, SyncError>
    where
        R: Radio,
        B: BatteryMonitor,
        D: Renderer,
    {
        let mut report = SessionReport::default();
        loop {
            if report.rounds >= self.config.max_rounds_per_wake {
                report.hit_round_limit = true;
                return Ok(report);
            }

            let outcome = self.run_round(radio, battery, renderer)?;
            report.rounds += 1;
            report.last = Some(outcome);

            match outcome {
                RoundOutcome::ChunkStored {
                    image_id, adopted, ..
                } => {
                    report.chunks_stored += 1;
                    if adopted {
                        report.adopted_image = Some(image_id);
                    }
                }
                RoundOutcome::Duplicate { .. } => report.duplicates += 1,
                RoundOutcome::Completed {
                    image_id, adopted, ..
                } => {
                    report.chunks_stored += 1;
                    report.completed = true;
                    if adopted {
                        report.adopted_image = Some(image_id);
                    }
                }
                _ => {}
            }

            if !outcome.wants_more() {
                return Ok(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use inktag_hal::mock::MemFlash;
    use inktag_hal::FlashError;
    use inktag_protocol::CHUNK_SIZE;

    use crate::config::StoreConfig;
    use crate::image::ChunkIndex;
    use crate::traits::{CompletedImage, RadioAddress};

    type Flash = MemFlash<8192>;

    const TAG_ID: u32 = 0x5012_3456;
    const GATEWAY: u32 = 0x55AB_CDEF;

    enum Step {
        Reply(DataMessage),
        Silence,
        Corrupt,
        TxTimeout,
    }

    #[derive(Default)]
    struct ScriptedRadio {
        script: VecDeque<Step>,
        sent: Vec<(RadioAddress, Vec<u8>)>,
        listened: Vec<(RadioAddress, u32)>,
        sleeps: u32,
        not_ready: bool,
    }

    impl ScriptedRadio {
        fn push(&mut self, step: Step) {
            self.script.push_back(step);
        }

        fn last_hello(&self) -> Hello {
            Hello::decode(&self.sent.last().unwrap().1).unwrap()
        }
    }

    impl Radio for ScriptedRadio {
        fn transmit(&mut self, dest: RadioAddress, payload: &[u8]) -> Result<(), RadioError> {
            if self.not_ready {
                return Err(RadioError::NotReady);
            }
            if matches!(self.script.front(), Some(Step::TxTimeout)) {
                self.script.pop_front();
                return Err(RadioError::Timeout);
            }
            self.sent.push((dest, payload.to_vec()));
            Ok(())
        }

        fn receive(
            &mut self,
            own: RadioAddress,
            buf: &mut [u8],
            timeout: u32,
        ) -> Result<Option<usize>, RadioError> {
            self.listened.push((own, timeout));
            match self.script.pop_front() {
                Some(Step::Reply(msg)) => Ok(Some(msg.encode(buf).unwrap())),
                Some(Step::Corrupt) => Err(RadioError::CorruptedReceive),
                Some(Step::Silence) | Some(Step::TxTimeout) | None => Ok(None),
            }
        }

        fn sleep(&mut self) -> Result<(), RadioError> {
            self.sleeps += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        renders: Vec<CompletedImage>,
        first_bytes: Vec<u8>,
        fail: bool,
    }

    impl Renderer for RecordingRenderer {
        fn render<F: SerialFlash>(
            &mut self,
            flash: &mut F,
            image: &CompletedImage,
        ) -> Result<(), RenderError> {
            if self.fail {
                return Err(RenderError::PanelTimeout);
            }
            let mut first = [0u8; 1];
            flash
                .read(image.payload.start, &mut first)
                .map_err(|_| RenderError::Flash)?;
            self.first_bytes.push(first[0]);
            self.renders.push(image.clone());
            Ok(())
        }
    }

    fn sync_config() -> SyncConfig {
        SyncConfig {
            gateway: RadioAddress(GATEWAY),
            rx_timeout: 500,
            max_rounds_per_wake: 200,
            ..SyncConfig::default()
        }
    }

    fn engine_with(config: SyncConfig) -> SyncEngine<Flash> {
        let store = ImageStore::load(
            Flash::new(),
            &StoreConfig {
                flash_base: 4096,
                chunk_count: 125,
            },
        )
        .unwrap();
        let identity = TagIdentity {
            tag_type: 1,
            tag_id: TAG_ID,
            firmware_hash: 0xCAFE_F00D,
            install_time: 1_700_000_000,
        };
        SyncEngine::new(identity, config, store)
    }

    fn engine() -> SyncEngine<Flash> {
        engine_with(sync_config())
    }

    fn chunk(image_id: u32, index: u16, fill: u8) -> Step {
        Step::Reply(DataMessage::chunk(
            image_id,
            index * CHUNK_SIZE as u16,
            [fill; CHUNK_SIZE],
        ))
    }

    fn stored_chunk(engine: &mut SyncEngine<Flash>, index: u16) -> [u8; CHUNK_SIZE] {
        let mut buf = [0u8; CHUNK_SIZE];
        engine
            .store_mut()
            .read_chunk(ChunkIndex::new(index).unwrap(), &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_image_switch_and_completion() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut battery = 3000u16;
        let mut renderer = RecordingRenderer::default();

        assert_eq!(engine.store().image_id(), 0);
        assert_eq!(engine.store().chunk_map().count(), 0);

        // First chunk of image 7
        radio.push(chunk(7, 0, 0xA0));
        let outcome = engine.run_round(&mut radio, &mut battery, &mut renderer).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::ChunkStored {
                image_id: 7,
                index: 0,
                adopted: true
            }
        );
        assert!(engine.store().chunk_map().get(ChunkIndex::new(0).unwrap()));
        assert_eq!(stored_chunk(&mut engine, 0), [0xA0; CHUNK_SIZE]);
        assert!(!engine.store().is_complete());

        // Gateway moves on to image 9
        radio.push(chunk(9, 0, 0xB0));
        let outcome = engine.run_round(&mut radio, &mut battery, &mut renderer).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::ChunkStored {
                image_id: 9,
                index: 0,
                adopted: true
            }
        );
        assert_eq!(engine.store().image_id(), 9);
        let mut expected = [0u8; 16];
        expected[0] = 0x01;
        assert_eq!(engine.store().chunk_map().as_bytes(), &expected);
        assert_eq!(stored_chunk(&mut engine, 0), [0xB0; CHUNK_SIZE]);

        // Everything else for image 9, one chunk per round
        for index in 1..124 {
            radio.push(chunk(9, index, index as u8));
            let outcome = engine.run_round(&mut radio, &mut battery, &mut renderer).unwrap();
            assert!(matches!(outcome, RoundOutcome::ChunkStored { adopted: false, .. }));
            assert!(!engine.store().is_complete());
        }
        assert!(renderer.renders.is_empty());

        radio.push(chunk(9, 124, 0xEE));
        let outcome = engine.run_round(&mut radio, &mut battery, &mut renderer).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::Completed {
                image_id: 9,
                adopted: false,
                render_error: None,
                persist_error: None
            }
        );
        assert!(engine.store().is_complete());
        assert!(engine.store().is_marked_complete());
        assert_eq!(renderer.renders.len(), 1);
        assert_eq!(renderer.renders[0].image_id, 9);
        assert_eq!(renderer.first_bytes, vec![0xB0]);

        // A late duplicate does not draw again
        radio.push(chunk(9, 124, 0xEE));
        let outcome = engine.run_round(&mut radio, &mut battery, &mut renderer).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::Duplicate {
                image_id: 9,
                index: 124
            }
        );
        assert_eq!(renderer.renders.len(), 1);
    }

    #[test]
    fn test_session_downloads_whole_image() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();

        for index in 0..125 {
            radio.push(chunk(4, index, 0x11));
        }
        let report = engine
            .run_session(&mut radio, &mut 2900u16, &mut renderer)
            .unwrap();

        assert_eq!(report.rounds, 125);
        assert_eq!(report.chunks_stored, 125);
        assert_eq!(report.adopted_image, Some(4));
        assert!(report.completed);
        assert!(!report.hit_round_limit);
        assert!(matches!(report.last, Some(RoundOutcome::Completed { .. })));
        assert_eq!(renderer.renders.len(), 1);
        assert_eq!(radio.sleeps, 1);
    }

    #[test]
    fn test_hello_reflects_store() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();

        radio.push(chunk(7, 3, 0));
        engine.run_round(&mut radio, &mut 2750u16, &mut renderer).unwrap();
        radio.push(Step::Silence);
        engine.run_round(&mut radio, &mut 2750u16, &mut renderer).unwrap();

        let (dest, _) = &radio.sent[0];
        assert_eq!(*dest, RadioAddress(GATEWAY));
        assert_eq!(radio.listened[0], (RadioAddress(TAG_ID), 500));

        let first = Hello::decode(&radio.sent[0].1).unwrap();
        assert_eq!(first.image_id, 0);
        assert_eq!(first.chunk_map, [0; 16]);

        let hello = radio.last_hello();
        assert_eq!(hello.tag_id, TAG_ID);
        assert_eq!(hello.tag_type, 1);
        assert_eq!(hello.firmware_hash, 0xCAFE_F00D);
        assert_eq!(hello.install_time, 1_700_000_000);
        assert_eq!(hello.battery_mv, 2750);
        assert_eq!(hello.image_id, 7);
        assert_eq!(hello.chunk_map[0], 0b0000_1000);
    }

    #[test]
    fn test_soft_failures_leave_store_alone() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        radio.push(chunk(7, 0, 0));
        engine.run_round(&mut radio, &mut 0u16, &mut renderer).unwrap();
        let writes = engine.store_mut().flash_mut().write_count();

        radio.push(Step::TxTimeout);
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::TransmitFailed)
        );
        radio.push(Step::Silence);
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::NoReply)
        );
        radio.push(Step::Corrupt);
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Corrupted)
        );
        radio.push(Step::Reply(DataMessage::synced(7)));
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Synced)
        );

        assert_eq!(engine.store_mut().flash_mut().write_count(), writes);
        assert_eq!(engine.store().image_id(), 7);
        assert_eq!(engine.store().chunk_map().count(), 1);
    }

    #[test]
    fn test_bad_offset_does_not_reset() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        radio.push(chunk(7, 0, 0));
        engine.run_round(&mut radio, &mut 0u16, &mut renderer).unwrap();

        radio.push(Step::Reply(DataMessage::chunk(8, 17, [0; CHUNK_SIZE])));
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Rejected {
                image_id: 8,
                offset: 17
            })
        );
        radio.push(Step::Reply(DataMessage::chunk(8, 125 * 32, [0; CHUNK_SIZE])));
        assert!(matches!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Rejected { .. })
        ));
        radio.push(chunk(0, 1, 0));
        assert!(matches!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Rejected { image_id: 0, .. })
        ));

        assert_eq!(engine.store().image_id(), 7);
        assert_eq!(engine.store().chunk_map().count(), 1);
    }

    #[test]
    fn test_session_stops_on_quiet_gateway() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        radio.push(chunk(7, 0, 0));
        radio.push(chunk(7, 0, 0));
        radio.push(chunk(7, 1, 0));
        radio.push(Step::Silence);
        radio.push(chunk(7, 2, 0));

        let report = engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert_eq!(report.rounds, 4);
        assert_eq!(report.chunks_stored, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.last, Some(RoundOutcome::NoReply));
        assert!(!report.completed);
        assert_eq!(radio.sleeps, 1);
        // Untouched script entry stays for the next wake
        assert_eq!(radio.script.len(), 1);
    }

    #[test]
    fn test_session_round_limit() {
        let mut engine = engine_with(SyncConfig {
            max_rounds_per_wake: 3,
            ..sync_config()
        });
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        for index in 0..5 {
            radio.push(chunk(7, index, 0));
        }

        let report = engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert_eq!(report.rounds, 3);
        assert!(report.hit_round_limit);
        assert_eq!(engine.store().chunk_map().count(), 3);
        assert_eq!(radio.sleeps, 1);
    }

    #[test]
    fn test_unusable_radio_still_sleeps() {
        let mut engine = engine();
        let mut radio = ScriptedRadio {
            not_ready: true,
            ..ScriptedRadio::default()
        };
        let mut renderer = RecordingRenderer::default();

        assert_eq!(
            engine.run_session(&mut radio, &mut 0u16, &mut renderer),
            Err(SyncError::Radio(RadioError::NotReady))
        );
        assert_eq!(radio.sleeps, 1);
    }

    #[test]
    fn test_render_failure_is_reported() {
        let mut engine = engine_with(sync_config());
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer {
            fail: true,
            ..RecordingRenderer::default()
        };
        for index in 0..125 {
            radio.push(chunk(2, index, 0));
        }
        let report = engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert_eq!(
            report.last,
            Some(RoundOutcome::Completed {
                image_id: 2,
                adopted: false,
                render_error: Some(RenderError::PanelTimeout),
                persist_error: None
            })
        );
        // Completion is persisted regardless of the panel
        assert!(engine.store().is_marked_complete());
    }

    #[test]
    fn test_flag_write_failure_still_draws() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        for index in 0..124 {
            radio.push(chunk(6, index, 0x33));
            engine.run_round(&mut radio, &mut 0u16, &mut renderer).unwrap();
        }

        // Payload and map byte land, the complete flag does not
        engine.store_mut().flash_mut().cut_power_after(2);
        radio.push(chunk(6, 124, 0x33));
        let outcome = engine.run_round(&mut radio, &mut 0u16, &mut renderer).unwrap();
        assert_eq!(
            outcome,
            RoundOutcome::Completed {
                image_id: 6,
                adopted: false,
                render_error: None,
                persist_error: Some(StoreError::Flash(FlashError::Bus))
            }
        );
        assert_eq!(renderer.renders.len(), 1);
        assert_eq!(renderer.first_bytes, vec![0x33]);
        assert!(engine.store().is_complete());
        assert!(!engine.store().is_marked_complete());

        // Next synced reply persists the flag without drawing again
        engine.store_mut().flash_mut().restore_power();
        radio.push(Step::Reply(DataMessage::synced(6)));
        assert_eq!(
            engine.run_round(&mut radio, &mut 0u16, &mut renderer),
            Ok(RoundOutcome::Synced)
        );
        assert!(engine.store().is_marked_complete());
        assert_eq!(renderer.renders.len(), 1);
    }

    #[test]
    fn test_duplicate_retries_flag_write() {
        let mut engine = engine();
        let mut radio = ScriptedRadio::default();
        let mut renderer = RecordingRenderer::default();
        for index in 0..124 {
            radio.push(chunk(6, index, 0));
        }
        engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();

        engine.store_mut().flash_mut().cut_power_after(2);
        radio.push(chunk(6, 124, 0));
        let report = engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert!(report.completed);
        assert!(!engine.store().is_marked_complete());

        engine.store_mut().flash_mut().restore_power();
        radio.push(chunk(6, 124, 0));
        let report = engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert_eq!(report.duplicates, 1);
        assert!(engine.store().is_marked_complete());
        assert_eq!(renderer.renders.len(), 1);
    }

    #[test]
    fn test_render_stored() {
        let mut engine = engine();
        let mut renderer = RecordingRenderer::default();
        assert_eq!(engine.render_stored(&mut renderer), Ok(false));

        let mut radio = ScriptedRadio::default();
        for index in 0..125 {
            radio.push(chunk(5, index, 0x42));
        }
        engine
            .run_session(&mut radio, &mut 0u16, &mut renderer)
            .unwrap();
        assert_eq!(engine.render_stored(&mut renderer), Ok(true));
        assert_eq!(renderer.renders.len(), 2);
        assert_eq!(renderer.first_bytes, vec![0x42, 0x42]);
    }
}
