use crate::error::Error;

use bytes::{BufMut, Bytes, BytesMut};
use nom::{
    multi::count,
    number::complete::{be_u16, be_u8},
    sequence::tuple,
    IResult,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const EXCEPTION_BIT: u8 = 0x80;
pub const MAX_READ_REGISTERS: u16 = 125;

/// unit + function + exception code + crc
pub const EXCEPTION_FRAME_LEN: usize = 5;
/// unit + function + address + value + crc
pub const ECHO_FRAME_LEN: usize = 8;

const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    ReadHoldingRegisters = 0x03,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
}

/// CRC-16/MODBUS: reflected polynomial 0xA001, initial value 0xFFFF.
pub fn crc16(data: &[u8]) -> u16 {
    crc16::State::<crc16::MODBUS>::calculate(data)
}

/// True when the last two bytes are the little-endian CRC of the rest.
pub fn has_valid_crc(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    crc16(body).to_le_bytes() == tail
}

fn finish(mut frame: BytesMut) -> Bytes {
    let crc = crc16(&frame);
    frame.put_u16_le(crc);
    frame.freeze()
}

fn request(unit: u8, function: FunctionCode, address: u16, value: u16) -> Bytes {
    let mut frame = BytesMut::with_capacity(ECHO_FRAME_LEN);
    frame.put_u8(unit);
    frame.put_u8(function.into());
    frame.put_u16(address);
    frame.put_u16(value);
    finish(frame)
}

pub fn build_read_request(unit: u8, start: u16, count: u16) -> Bytes {
    request(unit, FunctionCode::ReadHoldingRegisters, start, count)
}

pub fn build_write_coil(unit: u8, address: u16, on: bool) -> Bytes {
    let value = if on { COIL_ON } else { COIL_OFF };
    request(unit, FunctionCode::WriteSingleCoil, address, value)
}

pub fn build_write_register(unit: u8, address: u16, value: u16) -> Bytes {
    request(unit, FunctionCode::WriteSingleRegister, address, value)
}

/// Builds a well-formed read response; used by simulators and tests.
pub fn build_read_response(unit: u8, registers: &[u16]) -> Bytes {
    let mut frame = BytesMut::with_capacity(read_response_len(registers.len() as u16));
    frame.put_u8(unit);
    frame.put_u8(FunctionCode::ReadHoldingRegisters.into());
    frame.put_u8((registers.len() * 2) as u8);
    for register in registers {
        frame.put_u16(*register);
    }
    finish(frame)
}

pub fn build_exception_response(unit: u8, function: u8, code: u8) -> Bytes {
    let mut frame = BytesMut::with_capacity(EXCEPTION_FRAME_LEN);
    frame.put_u8(unit);
    frame.put_u8(function | EXCEPTION_BIT);
    frame.put_u8(code);
    finish(frame)
}

pub fn read_response_len(count: u16) -> usize {
    3 + count as usize * 2 + 2
}

fn header(input: &[u8]) -> IResult<&[u8], (u8, u8, u8)> {
    tuple((be_u8, be_u8, be_u8))(input)
}

fn registers(input: &[u8], n: usize) -> IResult<&[u8], Vec<u16>> {
    count(be_u16, n)(input)
}

fn exception(frame: &[u8]) -> Error {
    Error::Exception {
        function: frame[1] & !EXCEPTION_BIT,
        code: frame[2],
    }
}

/// Decodes a function 0x03 response to a request for `count` registers.
pub fn parse_read_response(frame: &[u8], unit: u8, count: u16) -> Result<Vec<u16>, Error> {
    let (rest, (address, function, byte_count)) =
        header(frame).map_err(|_| Error::Frame(format!("short response: {}", hex(frame))))?;

    if address != unit {
        return Err(Error::Frame(format!("unit {} in response, expected {}", address, unit)));
    }

    if function & EXCEPTION_BIT != 0 {
        if frame.len() >= EXCEPTION_FRAME_LEN && has_valid_crc(&frame[..EXCEPTION_FRAME_LEN]) {
            return Err(exception(frame));
        }
        return Err(Error::Frame(format!("corrupt exception response: {}", hex(frame))));
    }

    if function != u8::from(FunctionCode::ReadHoldingRegisters) {
        return Err(Error::Frame(format!("unexpected function 0x{:02x}", function)));
    }

    if byte_count as usize != count as usize * 2 {
        return Err(Error::Frame(format!(
            "byte count {} does not match {} registers",
            byte_count, count
        )));
    }

    let len = read_response_len(count);
    if frame.len() < len {
        return Err(Error::Frame(format!("truncated response: {}", hex(frame))));
    }
    if !has_valid_crc(&frame[..len]) {
        return Err(Error::Frame(format!("crc mismatch: {}", hex(&frame[..len]))));
    }

    let (_, values) = registers(rest, count as usize)
        .map_err(|e| Error::Frame(format!("register payload: {:?}", e)))?;

    Ok(values)
}

/// Validates the echoed reply to a write coil / write register request.
///
/// The exception bit is checked before anything else; otherwise the CRC must
/// hold and the first six bytes must equal the request's.
pub fn validate_echo(request: &[u8], response: &[u8]) -> Result<(), Error> {
    if response.len() >= 3 && response[1] & EXCEPTION_BIT != 0 {
        return Err(exception(response));
    }

    if response.len() < ECHO_FRAME_LEN {
        return Err(Error::Frame(format!("short echo: {}", hex(response))));
    }

    let response = &response[..ECHO_FRAME_LEN];
    if !has_valid_crc(response) {
        return Err(Error::Frame(format!("echo crc mismatch: {}", hex(response))));
    }

    if request.len() < 6 || request[..6] != response[..6] {
        return Err(Error::Frame(format!(
            "echo mismatch: sent {} got {}",
            hex(request),
            hex(response)
        )));
    }

    Ok(())
}

pub fn describe_exception(code: u8) -> &'static str {
    match code {
        0x01 => "illegal function",
        0x02 => "illegal data address",
        0x03 => "illegal data value",
        0x04 => "server device failure",
        0x05 => "acknowledge",
        0x06 => "server device busy",
        0x08 => "memory parity error",
        0x0A => "gateway path unavailable",
        0x0B => "gateway target failed to respond",
        _ => "unknown exception",
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coil_values() {
        assert_eq!(&build_write_coil(1, 0x11, true)[..6], &[1, 5, 0, 0x11, 0xFF, 0]);
        assert_eq!(&build_write_coil(1, 0x11, false)[..6], &[1, 5, 0, 0x11, 0, 0]);
    }

    #[test]
    fn exception_descriptions() {
        assert_eq!(describe_exception(2), "illegal data address");
        assert_eq!(describe_exception(0x7f), "unknown exception");
    }

    #[test]
    fn crc_needs_a_body() {
        assert!(!has_valid_crc(&[0xff, 0xff]));
    }
}
