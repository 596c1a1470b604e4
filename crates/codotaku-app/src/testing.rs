//! In-memory platform that records every call, for lifecycle tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use codotaku_gpu::{
    ClearPass, DeviceRequest, GpuDriver, GpuError, PresentMode, ShaderFormats,
    SwapchainComposition,
};

use crate::platform::{AppWindow, GpuDevice, Platform, PlatformError, WindowDescriptor, WindowId};

/// One recorded platform call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitVideo,
    CreateWindow(WindowDescriptor),
    CreateDevice(DeviceRequest),
    Claim(WindowId),
    SupportsPresentMode(PresentMode),
    SetSwapchain(SwapchainComposition, PresentMode),
    Show(WindowId),
    Update,
    AcquireCommandBuffer,
    AcquireSwapchain,
    Clear,
    Submit,
    WaitIdle,
    Release(WindowId),
    DestroyWindow(WindowId),
    DestroyDevice,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

/// Which operations should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub video: bool,
    pub window: bool,
    pub claim: bool,
    pub show: bool,
    pub swapchain: bool,
    pub acquire: bool,
    pub submit: bool,
}

pub struct MockPlatform {
    log: CallLog,
    next_window_id: u64,
    pub drivers: Vec<String>,
    pub mailbox_supported: bool,
    pub fail: Failures,
}

impl MockPlatform {
    /// A platform with a Vulkan driver and mailbox support.
    ///
    /// `drivers` lists what is compiled in; [`Platform::gpu_drivers`] reports
    /// only those that accept the requested shader formats, as wgpu would.
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            next_window_id: 1,
            drivers: vec!["vulkan".to_string()],
            mailbox_supported: true,
            fail: Failures::default(),
        }
    }

    /// A platform with no GPU drivers at all.
    pub fn headless() -> Self {
        Self {
            drivers: Vec::new(),
            ..Self::new()
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Platform for MockPlatform {
    type Window = MockWindow;
    type Device = MockDevice;

    fn init_video(&mut self) -> Result<(), PlatformError> {
        self.record(Call::InitVideo);
        if self.fail.video {
            return Err(PlatformError::VideoUnavailable("no display".into()));
        }
        Ok(())
    }

    fn create_window(&mut self, descriptor: &WindowDescriptor) -> Result<MockWindow, PlatformError> {
        self.record(Call::CreateWindow(descriptor.clone()));
        if self.fail.window {
            return Err(PlatformError::WindowCreation("refused".into()));
        }
        let id = WindowId::new(self.next_window_id);
        self.next_window_id += 1;
        Ok(MockWindow {
            id,
            visible: Cell::new(!descriptor.hidden),
            fail_show: self.fail.show,
            log: self.log(),
        })
    }

    fn gpu_drivers(&self, formats: ShaderFormats) -> Vec<String> {
        self.drivers
            .iter()
            .filter(|name| GpuDriver::from_name(name).is_some_and(|d| d.accepts(formats)))
            .cloned()
            .collect()
    }

    fn create_gpu_device(&mut self, request: &DeviceRequest) -> Result<MockDevice, PlatformError> {
        self.record(Call::CreateDevice(request.clone()));
        let driver = match &request.driver {
            Some(driver) => driver.clone(),
            None => self
                .gpu_drivers(request.shader_formats)
                .into_iter()
                .next()
                .ok_or(GpuError::NoAdapter)?,
        };
        Ok(MockDevice {
            log: self.log(),
            driver,
            mailbox_supported: self.mailbox_supported,
            fail: self.fail,
            texture_available: true,
            claimed: None,
            claim_count: 0,
            last_clear: None,
        })
    }
}

pub struct MockWindow {
    id: WindowId,
    visible: Cell<bool>,
    fail_show: bool,
    log: CallLog,
}

impl MockWindow {
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl AppWindow for MockWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn show(&self) -> Result<(), PlatformError> {
        self.log.borrow_mut().push(Call::Show(self.id));
        if self.fail_show {
            return Err(PlatformError::ShowWindow("compositor said no".into()));
        }
        self.visible.set(true);
        Ok(())
    }
}

impl Drop for MockWindow {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Call::DestroyWindow(self.id));
    }
}

pub struct MockDevice {
    log: CallLog,
    driver: String,
    mailbox_supported: bool,
    pub fail: Failures,
    pub texture_available: bool,
    claimed: Option<WindowId>,
    claim_count: usize,
    last_clear: Option<wgpu::Color>,
}

/// Frame state of the mock: whether a texture was acquired.
pub struct MockCommandBuffer {
    has_texture: bool,
}

impl MockDevice {
    pub fn claim_count(&self) -> usize {
        self.claim_count
    }

    pub fn last_clear(&self) -> Option<wgpu::Color> {
        self.last_clear
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl GpuDevice for MockDevice {
    type Window = MockWindow;
    type CommandBuffer = MockCommandBuffer;

    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn claim_window(&mut self, window: &MockWindow) -> Result<(), PlatformError> {
        self.record(Call::Claim(window.id()));
        self.claim_count += 1;
        if self.claimed.is_some() {
            return Err(GpuError::AlreadyClaimed.into());
        }
        if self.fail.claim {
            return Err(GpuError::UnsupportedSurface.into());
        }
        self.claimed = Some(window.id());
        Ok(())
    }

    fn supports_present_mode(&self, _window: &MockWindow, mode: PresentMode) -> bool {
        self.record(Call::SupportsPresentMode(mode));
        match mode {
            PresentMode::Vsync => true,
            PresentMode::Mailbox => self.mailbox_supported,
        }
    }

    fn set_swapchain_parameters(
        &mut self,
        _window: &MockWindow,
        composition: SwapchainComposition,
        mode: PresentMode,
    ) -> Result<(), PlatformError> {
        self.record(Call::SetSwapchain(composition, mode));
        if self.fail.swapchain {
            return Err(GpuError::Validation("surface configure rejected".into()).into());
        }
        if self.claimed.is_none() {
            return Err(GpuError::NotClaimed.into());
        }
        Ok(())
    }

    fn acquire_command_buffer(&mut self) -> Result<MockCommandBuffer, PlatformError> {
        self.record(Call::AcquireCommandBuffer);
        Ok(MockCommandBuffer { has_texture: false })
    }

    fn wait_and_acquire_swapchain_texture(
        &mut self,
        cmd: &mut MockCommandBuffer,
        _window: &MockWindow,
    ) -> Result<bool, PlatformError> {
        self.record(Call::AcquireSwapchain);
        if self.fail.acquire {
            return Err(GpuError::SurfaceLost.into());
        }
        if self.claimed.is_none() {
            return Err(GpuError::NotClaimed.into());
        }
        cmd.has_texture = self.texture_available;
        Ok(cmd.has_texture)
    }

    fn clear_swapchain(&mut self, cmd: &mut MockCommandBuffer, pass: &ClearPass) {
        if cmd.has_texture {
            self.record(Call::Clear);
            self.last_clear = Some(pass.color());
        }
    }

    fn submit(&mut self, _cmd: MockCommandBuffer) -> Result<(), PlatformError> {
        self.record(Call::Submit);
        if self.fail.submit {
            return Err(GpuError::Validation("Queue::submit: invalid command buffer".into()).into());
        }
        Ok(())
    }

    fn wait_idle(&mut self) {
        self.record(Call::WaitIdle);
    }

    fn release_window(&mut self, window: &MockWindow) {
        self.record(Call::Release(window.id()));
        self.claimed = None;
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Call::DestroyDevice);
    }
}
