//! Low-level interface to the MAX30009
//!
//! This module implements the register map of the MAX30009 and the SPI
//! transaction protocol used to access it. Every register is one byte wide
//! and is accessed with a 3-byte full-duplex exchange: the register address,
//! a direction byte (`0x80` for reads, `0x00` for writes), then either the
//! value to write or a dummy byte clocked out while the answer is received.
//!
//! The driver keeps a pair of shadow bytes per register: the last value read
//! back from the chip and the value staged for the next write. Typed
//! accessors mutate the write shadow through generated field methods and
//! commit it with a verified write transaction.

use core::fmt;
use core::marker::PhantomData;

use embedded_hal::{blocking::spi, digital::v2::OutputPin};

/// Direction byte for a read transaction
const DIR_READ: u8 = 0x80;

/// Direction byte for a write transaction
const DIR_WRITE: u8 = 0x00;

/// Filler clocked out while the chip drives the bus
const DUMMY: u8 = 0xFF;

/// Address of the sample-queue data register, used for burst reads
pub const FIFO_DATA_ADDRESS: u8 = 0x0C;

/// How many times a failed register transaction is retried
const TRANSACTION_RETRIES: u32 = 30;

/// Shadow state kept for one register
#[derive(Clone, Copy, Default)]
struct Shadow {
    /// Last value read back from the chip
    read: u8,
    /// Value staged for the next write
    write: u8,
}

/// Entry point to the MAX30009's low-level API
pub struct MAX30009<SPI, CS> {
    spi: SPI,
    chip_select: CS,
    initialized: bool,
    shadows: [Shadow; REGISTER_COUNT],
}

impl<SPI, CS> MAX30009<SPI, CS> {
    /// Create a new instance of `MAX30009`
    ///
    /// Requires the SPI peripheral and the chip select pin that are connected
    /// to the MAX30009. Runs a bit-order self-check on the generated field
    /// views; if the check fails the instance is marked uninitialized and
    /// every transaction returns [`Error::Uninitialized`] without touching
    /// the bus.
    pub fn new(spi: SPI, chip_select: CS) -> Self {
        let mut probe = status_1::W(0);
        probe.pwr_rdy(1);
        let probe = status_1::R(probe.0);
        let initialized = probe.pwr_rdy() == 1 && probe.a_full() == 0;

        MAX30009 {
            spi,
            chip_select,
            initialized,
            shadows: [Shadow::default(); REGISTER_COUNT],
        }
    }

    /// Whether the construction-time self-check passed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The shadow pair for a register, as `(read, write)`
    ///
    /// Returns `None` for addresses outside the register table.
    pub fn shadow(&self, address: u8) -> Option<(u8, u8)> {
        shadow_index(address).map(|index| {
            let shadow = &self.shadows[index];
            (shadow.read, shadow.write)
        })
    }

    /// Every address in the register table
    pub fn register_addresses() -> &'static [u8] {
        &REGISTER_ADDRESSES
    }

    /// Return the SPI peripheral and chip select pin
    pub fn free(self) -> (SPI, CS) {
        (self.spi, self.chip_select)
    }
}

impl<SPI, CS> MAX30009<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    fn transfer(&mut self, buffer: &mut [u8]) -> Result<(), Error<SPI, CS>> {
        self.chip_select
            .set_low()
            .map_err(|err| Error::ChipSelect(err))?;

        let result = self
            .spi
            .transfer(buffer)
            .map(|_| ())
            .map_err(|err| Error::Transfer(err));

        self.chip_select
            .set_high()
            .map_err(|err| Error::ChipSelect(err))?;

        result
    }

    /// Read a register by address, refreshing both shadows
    ///
    /// Retried on transport failure; the last transport error is returned if
    /// every attempt fails.
    pub fn read_register(&mut self, address: u8) -> Result<u8, Error<SPI, CS>> {
        let index = self.access_index(address)?;

        let mut attempts = 0;
        loop {
            let mut buffer = [address, DIR_READ, DUMMY];
            match self.transfer(&mut buffer) {
                Ok(()) => {
                    let value = buffer[2];
                    self.shadows[index].read = value;
                    self.shadows[index].write = value;
                    return Ok(value);
                }
                Err(error) => {
                    attempts += 1;
                    if attempts >= TRANSACTION_RETRIES {
                        return Err(error);
                    }
                }
            }
        }
    }

    /// Commit the write shadow of a register to the chip
    ///
    /// Sends the staged value, then reads the register back and compares.
    /// The whole write-then-verify cycle is retried; if no attempt verifies,
    /// [`Error::WriteVerify`] is returned. The verification read refreshes
    /// the read shadow.
    pub fn write_register(&mut self, address: u8) -> Result<(), Error<SPI, CS>> {
        let index = self.access_index(address)?;
        let intended = self.shadows[index].write;

        let mut attempts = 0;
        loop {
            let mut buffer = [address, DIR_WRITE, intended];
            if self.transfer(&mut buffer).is_ok() {
                let mut verify = [address, DIR_READ, DUMMY];
                if self.transfer(&mut verify).is_ok() {
                    self.shadows[index].read = verify[2];
                    if verify[2] == intended {
                        return Ok(());
                    }
                }
            }

            attempts += 1;
            if attempts >= TRANSACTION_RETRIES {
                return Err(Error::WriteVerify { address });
            }
        }
    }

    /// Commit the write shadow without reading it back
    ///
    /// Used for self-clearing pulse bits whose readback never matches the
    /// written value. Single attempt.
    pub fn write_register_unchecked(&mut self, address: u8) -> Result<(), Error<SPI, CS>> {
        let index = self.access_index(address)?;
        let mut buffer = [address, DIR_WRITE, self.shadows[index].write];
        self.transfer(&mut buffer)
    }

    /// Stage a raw value into the write shadow of a register
    pub fn stage_register(&mut self, address: u8, value: u8) -> Result<(), Error<SPI, CS>> {
        let index = self.access_index(address)?;
        self.shadows[index].write = value;
        Ok(())
    }

    /// Burst-read the hardware sample queue
    ///
    /// The first two bytes of `buffer` carry the transaction header and
    /// contain no sample data afterwards; sample words start at `buffer[2]`.
    /// Not retried, as a repeated transaction would drop queue data.
    pub fn read_fifo(&mut self, buffer: &mut [u8]) -> Result<(), Error<SPI, CS>> {
        if !self.initialized {
            return Err(Error::Uninitialized);
        }
        if buffer.len() < 2 {
            return Err(Error::BufferTooSmall);
        }

        buffer[0] = FIFO_DATA_ADDRESS;
        buffer[1] = DIR_READ;
        for byte in &mut buffer[2..] {
            *byte = DUMMY;
        }

        self.transfer(buffer)
    }

    fn access_index(&self, address: u8) -> Result<usize, Error<SPI, CS>> {
        if !self.initialized {
            return Err(Error::Uninitialized);
        }
        shadow_index(address).ok_or(Error::InvalidAddress { address })
    }
}

/// An error that can occur when reading from or writing to a register
pub enum Error<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    /// Error during the SPI transfer
    Transfer(<SPI as spi::Transfer<u8>>::Error),

    /// Error while changing the chip-select signal
    ChipSelect(<CS as OutputPin>::Error),

    /// The address is not part of the register table
    InvalidAddress {
        /// The offending address
        address: u8,
    },

    /// The construction-time self-check failed; no transactions are possible
    Uninitialized,

    /// A write could not be verified within the retry bound
    WriteVerify {
        /// Address of the register that failed to verify
        address: u8,
    },

    /// The caller-provided buffer has no room for the transaction header
    BufferTooSmall,
}

// We can't derive `Debug` with `#[derive(Debug)]`, as that will only work if
// the associated error types implement it, which we don't know.
impl<SPI, CS> fmt::Debug for Error<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Transfer(error) => write!(f, "Transfer({:?})", error),
            Error::ChipSelect(error) => write!(f, "ChipSelect({:?})", error),
            Error::InvalidAddress { address } => {
                write!(f, "InvalidAddress {{ address: 0x{:02x} }}", address)
            }
            Error::Uninitialized => write!(f, "Uninitialized"),
            Error::WriteVerify { address } => {
                write!(f, "WriteVerify {{ address: 0x{:02x} }}", address)
            }
            Error::BufferTooSmall => write!(f, "BufferTooSmall"),
        }
    }
}

/// Implemented for all registers
///
/// This is a mostly internal trait. You won't typically need to use this.
pub trait Register {
    /// The register's address in the register table
    const ADDR: u8;

    /// The register's index into the shadow array
    const INDEX: usize;
}

/// Marker trait for registers that can be read from
pub trait Readable: Register {
    /// The read view over the register's byte
    type Read;

    /// Wrap a register byte in the read view
    fn read_view(value: u8) -> Self::Read;
}

/// Marker trait for registers that can be written to
pub trait Writable: Register {
    /// The write view over the register's byte
    type Write;

    /// Wrap a register byte in the write view
    fn write_view(value: u8) -> Self::Write;

    /// The register byte carried by a write view
    fn write_value(w: &Self::Write) -> u8;
}

/// Mask for a bit field of the given length
const fn field_mask(len: u32) -> u8 {
    ((1u16 << len) - 1) as u8
}

/// Provides access to a register
///
/// You can get an instance for a given register using the register's
/// accessor method on [`MAX30009`].
pub struct RegAccessor<'s, R, SPI, CS>(&'s mut MAX30009<SPI, CS>, PhantomData<R>);

impl<'s, R, SPI, CS> RegAccessor<'s, R, SPI, CS> {
    /// View the read shadow through the register's field methods
    ///
    /// Does not touch the bus; reflects the last value read back.
    pub fn cached(&self) -> R::Read
    where
        R: Readable,
    {
        R::read_view(self.0.shadows[R::INDEX].read)
    }

    /// View the write shadow through the register's field methods
    ///
    /// Does not touch the bus; reflects the value staged for the next write.
    pub fn pending(&self) -> R::Read
    where
        R: Readable,
    {
        R::read_view(self.0.shadows[R::INDEX].write)
    }

    /// Update fields in the write shadow without starting a transaction
    pub fn stage<F>(&mut self, f: F)
    where
        R: Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::write_view(self.0.shadows[R::INDEX].write);
        f(&mut w);
        self.0.shadows[R::INDEX].write = R::write_value(&w);
    }
}

impl<'s, R, SPI, CS> RegAccessor<'s, R, SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    /// Read from the register
    pub fn read(&mut self) -> Result<R::Read, Error<SPI, CS>>
    where
        R: Readable,
    {
        let value = self.0.read_register(R::ADDR)?;
        Ok(R::read_view(value))
    }

    /// Update fields in the write shadow, then commit it with verification
    pub fn write<F>(&mut self, f: F) -> Result<(), Error<SPI, CS>>
    where
        R: Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        self.stage(f);
        self.0.write_register(R::ADDR)
    }

    /// Update fields in the write shadow, then commit it without verification
    ///
    /// For self-clearing pulse bits.
    pub fn write_unchecked<F>(&mut self, f: F) -> Result<(), Error<SPI, CS>>
    where
        R: Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        self.stage(f);
        self.0.write_register_unchecked(R::ADDR)
    }
}

/// Generates the register table
///
/// For each register this defines a marker struct, a module with `R` and `W`
/// views exposing the register's bit fields, the `Register` impl, the
/// `Readable`/`Writable` impls according to the access mode, and an accessor
/// method on `MAX30009`. It also generates the address table, the shadow
/// count, and the address-to-index lookup.
macro_rules! impl_rw {
    (RO, $name:ident, $name_lower:ident) => {
        impl_rw!(@readable, $name, $name_lower);
    };
    (RW, $name:ident, $name_lower:ident) => {
        impl_rw!(@readable, $name, $name_lower);
        impl_rw!(@writable, $name, $name_lower);
    };

    (@readable, $name:ident, $name_lower:ident) => {
        impl Readable for $name {
            type Read = $name_lower::R;

            fn read_view(value: u8) -> Self::Read {
                $name_lower::R(value)
            }
        }
    };
    (@writable, $name:ident, $name_lower:ident) => {
        impl Writable for $name {
            type Write = $name_lower::W;

            fn write_view(value: u8) -> Self::Write {
                $name_lower::W(value)
            }

            fn write_value(w: &Self::Write) -> u8 {
                w.0
            }
        }
    };
}

macro_rules! impl_registers {
    (
        $(
            $addr:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
                #[$doc:meta]
                $(
                    $field:ident,
                    $first_bit:expr,
                    $last_bit:expr;
                    #[$field_doc:meta]
                )*
            }
        )*
    ) => {
        #[allow(non_camel_case_types)]
        #[allow(dead_code)]
        enum RegIndex {
            $( $name, )*
            __Count,
        }

        /// Number of registers in the register table
        pub(crate) const REGISTER_COUNT: usize = RegIndex::__Count as usize;

        /// Every address in the register table
        pub const REGISTER_ADDRESSES: [u8; REGISTER_COUNT] = [ $( $addr, )* ];

        pub(crate) fn shadow_index(address: u8) -> Option<usize> {
            match address {
                $( $addr => Some(RegIndex::$name as usize), )*
                _ => None,
            }
        }

        impl<SPI, CS> MAX30009<SPI, CS> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<$name, SPI, CS> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }

        $(
            #[$doc]
            #[allow(non_camel_case_types)]
            pub struct $name;

            impl Register for $name {
                const ADDR: u8 = $addr;
                const INDEX: usize = RegIndex::$name as usize;
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                /// Used to read from the register
                #[derive(Clone, Copy)]
                pub struct R(pub(crate) u8);

                impl R {
                    $(
                        #[$field_doc]
                        pub fn $field(&self) -> u8 {
                            const MASK: u8 =
                                super::field_mask($last_bit - $first_bit + 1);
                            (self.0 >> $first_bit) & MASK
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x{:02x}", self.0)
                    }
                }

                /// Used to write to the register
                pub struct W(pub(crate) u8);

                impl W {
                    $(
                        #[$field_doc]
                        pub fn $field(&mut self, value: u8) -> &mut Self {
                            const MASK: u8 =
                                super::field_mask($last_bit - $first_bit + 1);
                            self.0 &= !(MASK << $first_bit);
                            self.0 |= (value & MASK) << $first_bit;
                            self
                        }
                    )*
                }
            }

            impl_rw!($rw, $name, $name_lower);
        )*
    }
}

impl_registers! {
    0x00, RO, STATUS_1(status_1) {
        /// Status flags, first bank
        pwr_rdy,       0, 0; /// Power-ready flag (active low)
        phase_lock,    1, 1; /// PLL phase locked
        phase_unlock,  2, 2; /// PLL phase lock lost
        freq_lock,     3, 3; /// PLL frequency locked
        freq_unlock,   4, 4; /// PLL frequency lock lost
        fifo_data_rdy, 5, 5; /// New data available in the sample queue
        a_full,        7, 7; /// Sample queue reached the full threshold
    }
    0x01, RO, STATUS_2(status_2) {
        /// Status flags, second bank
        dc_loff_nl, 0, 0; /// DC lead-off, negative input below threshold
        dc_loff_nh, 1, 1; /// DC lead-off, negative input above threshold
        dc_loff_pl, 2, 2; /// DC lead-off, positive input below threshold
        dc_loff_ph, 3, 3; /// DC lead-off, positive input above threshold
        drv_oor,    4, 4; /// Drive out of range
        bioz_undr,  5, 5; /// BioZ input under low threshold
        bioz_over,  6, 6; /// BioZ input over high threshold
        lon,        7, 7; /// Lead-on detected
    }
    0x08, RW, FIFO_WRITE_POINTER(fifo_write_pointer) {
        /// Sample-queue write pointer
        fifo_wr_ptr, 0, 7; /// Queue slot the chip writes to next
    }
    0x09, RW, FIFO_READ_POINTER(fifo_read_pointer) {
        /// Sample-queue read pointer
        fifo_rd_ptr, 0, 7; /// Queue slot the host reads from next
    }
    0x0A, RO, FIFO_COUNTER_1(fifo_counter_1) {
        /// Sample-queue counters, high part
        ovf_counter,         0, 6; /// Samples lost to overflow
        fifo_data_count_msb, 7, 7; /// Bit 8 of the sample count
    }
    0x0B, RO, FIFO_COUNTER_2(fifo_counter_2) {
        /// Sample-queue counters, low part
        fifo_data_count, 0, 7; /// Bits 0-7 of the sample count
    }
    0x0C, RO, FIFO_DATA_REGISTER(fifo_data_register) {
        /// Sample-queue data window
        fifo_data, 0, 7; /// Next queue byte
    }
    0x0D, RW, FIFO_CONFIGURATION_1(fifo_configuration_1) {
        /// Sample-queue configuration, full threshold
        fifo_a_full, 0, 7; /// Free slots left when the full flag asserts
    }
    0x0E, RW, FIFO_CONFIGURATION_2(fifo_configuration_2) {
        /// Sample-queue configuration, behavior
        fifo_ro,       1, 1; /// Roll over and overwrite when full
        a_full_type,   2, 2; /// Assert the full flag once per fill cycle
        fifo_stat_clr, 3, 3; /// Clear queue flags on data reads too
        flush_fifo,    4, 4; /// Flush the queue (self-clearing)
        fifo_mark,     5, 5; /// Push a marker word into the queue (self-clearing)
    }
    0x10, RW, SYSTEM_SYNC(system_sync) {
        /// System synchronization
        timing_sys_reset, 7, 7; /// Reset internal timing (self-clearing)
    }
    0x11, RW, SYSTEM_CONFIGURATION(system_configuration) {
        /// System configuration
        reset,       0, 0; /// Soft reset (self-clearing)
        shdn,        1, 1; /// Shutdown
        disable_i2c, 6, 6; /// Disable the I2C interface
        master,      7, 7; /// Timing master enable
    }
    0x12, RW, PIN_FUNCTIONAL_CONFIGURATION(pin_functional_configuration) {
        /// Pin function selection
        trig_icfg, 0, 0; /// Trigger input function
        int_fcfg,  2, 3; /// Interrupt pin function
    }
    0x13, RW, OUTPUT_PIN_CONFIGURATION(output_pin_configuration) {
        /// Pin output driver configuration
        trig_ocfg, 0, 1; /// Trigger pin output mode
        int_ocfg,  2, 3; /// Interrupt pin output mode
    }
    0x14, RW, I2C_BROADCAST_ADDRESS(i2c_broadcast_address) {
        /// I2C broadcast address
        i2c_bcast_en,   0, 0; /// Broadcast address enable
        i2c_bcast_addr, 1, 7; /// Broadcast address
    }
    0x17, RW, PLL_CONFIGURATION_1(pll_configuration_1) {
        /// PLL configuration: enable and dividers
        pll_en, 0, 0; /// PLL enable
        kdiv,   1, 4; /// Synthesis divider code
        ndiv,   5, 5; /// ADC clock divider select
        mdiv_h, 6, 7; /// PLL multiplier, bits 8-9
    }
    0x18, RW, PLL_CONFIGURATION_2(pll_configuration_2) {
        /// PLL configuration: multiplier low byte
        mdiv_l, 0, 7; /// PLL multiplier, bits 0-7
    }
    0x19, RW, PLL_CONFIGURATION_3(pll_configuration_3) {
        /// PLL configuration: lock detection
        pll_lock_wndw, 0, 0; /// Widen the phase-lock detection window
    }
    0x1A, RW, PLL_CONFIGURATION_4(pll_configuration_4) {
        /// PLL configuration: reference clock
        clk_fine_tune, 0, 4; /// Internal oscillator fine tune
        clk_freq_sel,  5, 5; /// Reference frequency: 32.0 kHz or 32.768 kHz
        ref_clk_sel,   6, 6; /// Reference source: internal or external
    }
    0x20, RW, BIOZ_CONFIGURATION_1(bioz_configuration_1) {
        /// BioZ configuration: channels and oversampling
        bioz_i_en,    0, 0; /// In-phase channel enable
        bioz_q_en,    1, 1; /// Quadrature channel enable
        bioz_bg_en,   2, 2; /// Bandgap enable
        bioz_adc_osr, 3, 5; /// ADC oversampling code
        bioz_dac_osr, 6, 7; /// DAC oversampling code
    }
    0x21, RW, BIOZ_CONFIGURATION_2(bioz_configuration_2) {
        /// BioZ configuration: thresholds and digital filters
        en_bioz_thresh, 0, 0; /// Range-threshold comparison enable
        bioz_cmp,       1, 2; /// Comparator configuration
        bioz_dlpf,      3, 5; /// Digital low-pass filter code
        bioz_dhpf,      6, 7; /// Digital high-pass filter code
    }
    0x22, RW, BIOZ_CONFIGURATION_3(bioz_configuration_3) {
        /// BioZ configuration: drive mode and amplitude
        bioz_drv_mode, 0, 1; /// Stimulus drive mode
        bioz_idrv_rge, 2, 3; /// Current drive range
        bioz_vdrv_mag, 4, 5; /// Voltage drive magnitude
        loff_rapid,    6, 6; /// Rapid lead-off mode
        bioz_ext_res,  7, 7; /// External resistor enable
    }
    0x23, RW, BIOZ_CONFIGURATION_4(bioz_configuration_4) {
        /// BioZ configuration: fast start
        bioz_fast_start_en, 0, 0; /// Fast-start enable
        bioz_fast_manual,   1, 1; /// Fast start under manual control
    }
    0x24, RW, BIOZ_CONFIGURATION_5(bioz_configuration_5) {
        /// BioZ configuration: gain and input stage
        bioz_gain,     0, 1; /// Total gain code
        bioz_dm_dis,   2, 2; /// Demodulation disable
        bioz_ina_mode, 3, 3; /// INA low-power mode
        bioz_ahpf,     4, 7; /// Analog high-pass filter code
    }
    0x25, RW, BIOZ_CONFIGURATION_6(bioz_configuration_6) {
        /// BioZ configuration: amplifier and resets
        bioz_amp_bw,     0, 1; /// Amplifier bandwidth
        bioz_amp_rge,    2, 3; /// Amplifier range
        bioz_dac_reset,  4, 4; /// Hold the DAC in reset
        bioz_drv_reset,  5, 5; /// Hold the driver in reset
        bioz_dc_restore, 6, 6; /// DC restore enable
        bioz_ext_cap,    7, 7; /// External capacitor enable
    }
    0x26, RW, BIOZ_LOW_THRESHOLD(bioz_low_threshold) {
        /// BioZ under-range threshold
        bioz_lo_thresh, 0, 7; /// Low threshold code
    }
    0x27, RW, BIOZ_HIGH_THRESHOLD(bioz_high_threshold) {
        /// BioZ over-range threshold
        bioz_hi_thresh, 0, 7; /// High threshold code
    }
    0x28, RW, BIOZ_CONFIGURATION_7(bioz_configuration_7) {
        /// BioZ configuration: clocking details
        bioz_ch_fsel,     0, 0; /// Channel frequency select
        bioz_ina_chop_en, 1, 1; /// INA chopper enable
        bioz_i_clk_phase, 2, 2; /// In-phase demodulation clock phase
        bioz_q_clk_phase, 3, 3; /// Quadrature demodulation clock phase
        bioz_stbyon,      4, 4; /// Keep the channel biased in standby
    }
    0x41, RW, BIOZ_MUX_CONFIGURATION_1(bioz_mux_configuration_1) {
        /// Input multiplexer: calibration and self-test
        cal_en,           0, 0; /// Calibration port enable
        mux_en,           1, 1; /// Multiplexer enable
        connect_cal_only, 2, 2; /// Connect the calibration port exclusively
        bmux_bist_en,     5, 5; /// Built-in self-test load enable
        bmux_rsel,        6, 7; /// Built-in self-test load select
    }
    0x42, RW, BIOZ_MUX_CONFIGURATION_2(bioz_mux_configuration_2) {
        /// Input multiplexer: input loads
        en_int_inload, 0, 0; /// Internal input load enable
        en_ext_inload, 1, 1; /// External input load enable
        gsr_load_en,   5, 5; /// GSR load enable
        bmux_gsr_rsel, 6, 7; /// GSR load select
    }
    0x43, RW, BIOZ_MUX_CONFIGURATION_3(bioz_mux_configuration_3) {
        /// Input multiplexer: electrode assignment
        drvn_assign, 0, 1; /// Negative drive electrode
        drvp_assign, 2, 3; /// Positive drive electrode
        bin_assign,  4, 5; /// Negative sense electrode
        bip_assign,  6, 7; /// Positive sense electrode
    }
    0x44, RO, BIOZ_MUX_CONFIGURATION_4(bioz_mux_configuration_4) {
        /// Input multiplexer: self-test result
        bist_r_err, 0, 7; /// Self-test load resistance error code
    }
    0x50, RW, DC_LEADS_CONFIGURATION(dc_leads_configuration) {
        /// DC lead detection configuration
        loff_imag,   0, 2; /// Lead-off current magnitude
        loff_ipol,   3, 3; /// Lead-off current polarity
        en_drv_oor,  4, 4; /// Drive out-of-range detection enable
        en_ext_loff, 5, 5; /// External lead-off detection enable
        en_loff_det, 6, 6; /// Lead-off detection enable
        en_lon_det,  7, 7; /// Lead-on detection enable
    }
    0x51, RW, DC_LEAD_DETECT_THRESHOLD(dc_lead_detect_threshold) {
        /// DC lead detection threshold
        loff_thresh, 0, 3; /// Lead-off comparator threshold code
    }
    0x58, RW, LEAD_BIAS_CONFIGURATION(lead_bias_configuration) {
        /// Lead bias configuration
        en_rbias_bin, 0, 0; /// Bias the negative sense input
        en_rbias_bip, 1, 1; /// Bias the positive sense input
        rbias_value,  2, 3; /// Bias resistance select
    }
    0x80, RW, INTERRUPT_ENABLE_1(interrupt_enable_1) {
        /// Interrupt enables, first bank
        phase_lock_en,    1, 1; /// Interrupt on PLL phase lock
        phase_unlock_en,  2, 2; /// Interrupt on PLL phase lock lost
        freq_lock_en,     3, 3; /// Interrupt on PLL frequency lock
        freq_unlock_en,   4, 4; /// Interrupt on PLL frequency lock lost
        fifo_data_rdy_en, 5, 5; /// Interrupt on new queue data
        a_full_en,        7, 7; /// Interrupt on queue full threshold
    }
    0x81, RW, INTERRUPT_ENABLE_2(interrupt_enable_2) {
        /// Interrupt enables, second bank
        dc_loff_nl_en, 0, 0; /// Interrupt on negative lead-off low
        dc_loff_nh_en, 1, 1; /// Interrupt on negative lead-off high
        dc_loff_pl_en, 2, 2; /// Interrupt on positive lead-off low
        dc_loff_ph_en, 3, 3; /// Interrupt on positive lead-off high
        drv_oor_en,    4, 4; /// Interrupt on drive out of range
        bioz_undr_en,  5, 5; /// Interrupt on BioZ under range
        bioz_over_en,  6, 6; /// Interrupt on BioZ over range
        lon_en,        7, 7; /// Interrupt on lead-on
    }
    0xFF, RO, PART_ID(part_id) {
        /// Part identifier
        part_id, 0, 7; /// Hardwired part ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_views_pack_and_unpack() {
        let mut w = pll_configuration_1::W(0);
        w.pll_en(1).kdiv(0x0D).ndiv(1).mdiv_h(0x03);
        assert_eq!(w.0, 0b1111_1011);

        let r = pll_configuration_1::R(w.0);
        assert_eq!(r.pll_en(), 1);
        assert_eq!(r.kdiv(), 0x0D);
        assert_eq!(r.ndiv(), 1);
        assert_eq!(r.mdiv_h(), 0x03);
    }

    #[test]
    fn field_writes_do_not_disturb_neighbors() {
        let mut w = bioz_configuration_3::W(0xFF);
        w.bioz_idrv_rge(0);
        assert_eq!(w.0, 0b1111_0011);
    }

    #[test]
    fn address_lookup_covers_the_table_and_nothing_else() {
        for &address in &REGISTER_ADDRESSES {
            assert!(shadow_index(address).is_some());
        }
        assert!(shadow_index(0x05).is_none());
        assert!(shadow_index(0x30).is_none());
        assert!(shadow_index(0xFE).is_none());
    }

    #[test]
    fn self_check_passes_on_this_target() {
        let device: MAX30009<(), ()> = MAX30009::new((), ());
        assert!(device.is_initialized());
    }
}
