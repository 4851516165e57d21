/*++

Licensed under the Apache-2.0 license.

File Name:

    dispatcher.rs

Abstract:

    Boot dispatcher: decides between installing a staged image, booting the
    resident one, and waiting for the host.

--*/

use crate::boot_status::BootState;
use crate::flag_page::FlagPageStore;
use crate::flash::hil::{ExternalFlash, FlashStorage, GpioInput, HostTransport, ImageLauncher};
use crate::image_verifier::{EntryPoint, ImageChecker, ImageVerifier, StorageKind};
use crate::installer::{install_from_external, install_from_internal};
use crate::session::{BootSession, MAX_TRACE};
use amboot_config::{BootStraps, ERASED_WORD};
use amboot_error::BootError;
use arrayvec::ArrayVec;
use bootutil::HexWord;
use flash_image::{BootOptions, ImageDescriptor, Polarity, VectorHeader, VECTOR_HEADER_SIZE};

/// Result of one pass through the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootOutcome {
    /// Either `BootExisting` or `WaitForHost`.
    pub state: BootState,
    /// Set when `state` is `BootExisting`.
    pub entry: Option<EntryPoint>,
    pub visited: ArrayVec<BootState, MAX_TRACE>,
    /// A staged image was copied to its link address and verified. If
    /// rewriting the flag page then failed, `last_error` says so and the
    /// update is applied again on the next boot.
    pub installed: bool,
    pub last_error: Option<BootError>,
}

pub struct BootDispatcher<'a> {
    flash: &'a dyn FlashStorage,
    external: Option<&'a mut dyn ExternalFlash>,
    gpio: &'a mut dyn GpioInput,
    straps: BootStraps,
    session: BootSession<'a>,
}

impl<'a> BootDispatcher<'a> {
    pub fn new(
        flash: &'a dyn FlashStorage,
        gpio: &'a mut dyn GpioInput,
        straps: BootStraps,
        session: BootSession<'a>,
    ) -> Self {
        BootDispatcher {
            flash,
            external: None,
            gpio,
            straps,
            session,
        }
    }

    /// Enables installing images staged in external flash.
    pub fn with_external(mut self, external: &'a mut dyn ExternalFlash) -> Self {
        self.external = Some(external);
        self
    }

    /// Runs the state machine once, from `CheckOverride` to a terminal
    /// state. Meant to be called once per reset.
    pub fn run(&mut self) -> BootOutcome {
        match self.session.map().flag_page_address() {
            Some(address) => self.run_with_flag_page(address),
            None => self.run_default_image(),
        }
    }

    /// Runs the state machine and leaves the bootloader: into the image on
    /// `BootExisting`, into the host transport otherwise.
    pub fn boot(
        &mut self,
        launcher: &mut dyn ImageLauncher,
        transport: &mut dyn HostTransport,
    ) -> ! {
        let outcome = self.run();
        match outcome.entry {
            Some(entry) => {
                bootutil::println!(
                    "[amboot] Jumping to image at {}",
                    HexWord(entry.vector_table)
                );
                launcher.launch(entry.vector_table, entry.stack_pointer, entry.reset_vector)
            }
            None => {
                bootutil::println!("[amboot] No bootable image; waiting for host");
                transport.wait_for_host()
            }
        }
    }

    fn run_with_flag_page(&mut self, address: u32) -> BootOutcome {
        let loaded = FlagPageStore::new(self.flash, address)
            .and_then(|store| Ok((store.load()?, store)));
        let (descriptor, store) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                bootutil::println!("[amboot] Flag page unreadable at {}", HexWord(address));
                return self.finish(None, Some(err), false);
            }
        };

        self.session.enter(BootState::CheckOverride);
        if self.override_engaged(&descriptor) {
            bootutil::println!("[amboot] Override pin engaged");
            return self.boot_existing(&descriptor, None, false);
        }

        self.session.enter(BootState::CheckNewImage);
        let kind = match descriptor.options {
            BootOptions::NoNewImage => return self.boot_existing(&descriptor, None, false),
            BootOptions::NewImageInternalFlash => StorageKind::Internal,
            BootOptions::NewImageExternalFlash => StorageKind::External,
        };

        self.session.enter(BootState::VerifyAndInstall);
        if let Err(err) = self.verify_and_install(&descriptor, kind) {
            bootutil::println!(
                "[amboot] Update not installed: error {}",
                HexWord(err.code())
            );
            return self.boot_existing(&descriptor, Some(err), false);
        }

        self.session.enter(BootState::UpdateFlagPage);
        let consumed = descriptor.consumed();
        match store.store(&consumed) {
            Ok(()) => self.boot_existing(&consumed, None, true),
            Err(err) => self.boot_existing(&consumed, Some(err), true),
        }
    }

    /// Without a flag page the compiled-in default image is booted when its
    /// first word is programmed. The override pin keeps the bootloader in
    /// control instead.
    fn run_default_image(&mut self) -> BootOutcome {
        self.session.enter(BootState::CheckOverride);
        let descriptor = ImageDescriptor {
            override_gpio: self.straps.default_override_gpio,
            override_polarity: self.straps.default_override_polarity,
            ..ImageDescriptor::resident(self.straps.default_link_address)
        };
        if self.override_engaged(&descriptor) {
            bootutil::println!("[amboot] Override pin engaged");
            return self.finish(None, None, false);
        }

        self.session.enter(BootState::BootExisting);
        let link_address = descriptor.link_address;
        let mut header = [0u8; VECTOR_HEADER_SIZE];
        if let Err(err) = self.flash.read(&mut header, link_address) {
            return self.finish(None, Some(err.into()), false);
        }
        let (stack_pointer, reset_vector) = VectorHeader::decode(&header);
        if stack_pointer == ERASED_WORD {
            return self.finish(None, None, false);
        }
        let entry = EntryPoint {
            vector_table: link_address,
            stack_pointer,
            reset_vector,
        };
        self.finish(Some(entry), None, false)
    }

    fn override_engaged(&mut self, descriptor: &ImageDescriptor) -> bool {
        let Some(pin) = descriptor.override_pin() else {
            return false;
        };
        self.gpio.configure_input(pin.gpio);
        let high = self.gpio.read(pin.gpio);
        match pin.polarity {
            Polarity::High => high,
            Polarity::Low => !high,
        }
    }

    fn verify(
        &mut self,
        descriptor: &ImageDescriptor,
        kind: StorageKind,
    ) -> Result<EntryPoint, BootError> {
        let map = self.session.map();
        let mut checker = ImageChecker::new(map, self.flash, self.session.page_buffer());
        if kind == StorageKind::External {
            let external = self
                .external
                .as_deref_mut()
                .ok_or(BootError::ExternalFlashFailed)?;
            checker = checker.with_external(external);
        }
        checker.verify(descriptor, kind)
    }

    fn verify_and_install(
        &mut self,
        descriptor: &ImageDescriptor,
        kind: StorageKind,
    ) -> Result<(), BootError> {
        self.verify(descriptor, kind)?;
        match kind {
            StorageKind::External => {
                let external = self
                    .external
                    .as_deref_mut()
                    .ok_or(BootError::ExternalFlashFailed)?;
                install_from_external(self.flash, external, &mut self.session, descriptor)
            }
            _ => install_from_internal(self.flash, &mut self.session, descriptor),
        }
    }

    fn boot_existing(
        &mut self,
        descriptor: &ImageDescriptor,
        last_error: Option<BootError>,
        installed: bool,
    ) -> BootOutcome {
        self.session.enter(BootState::BootExisting);
        match self.verify(descriptor, StorageKind::Resident) {
            Ok(entry) => self.finish(Some(entry), last_error, installed),
            Err(err) => {
                bootutil::println!(
                    "[amboot] Resident image at {} rejected",
                    HexWord(descriptor.link_address)
                );
                self.finish(None, Some(err), installed)
            }
        }
    }

    fn finish(
        &mut self,
        entry: Option<EntryPoint>,
        last_error: Option<BootError>,
        installed: bool,
    ) -> BootOutcome {
        let state = if entry.is_some() {
            BootState::BootExisting
        } else {
            self.session.enter(BootState::WaitForHost);
            BootState::WaitForHost
        };
        BootOutcome {
            state,
            entry,
            visited: self.session.trace().iter().copied().collect(),
            installed,
            last_error,
        }
    }
}
