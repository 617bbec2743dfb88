//! Infrared link emulated over UDP, for devices running in separate processes.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use super::LinkError;
use crate::protocol::SerialLink;

/// A connected UDP socket. Each byte travels in its own datagram, so losses and reordering behave like on the air.
pub struct UdpLink {
    socket: UdpSocket,
    received: VecDeque<u8>,
}

impl UdpLink {
    /// Bind a socket on `bind` and only exchange datagrams with `peer`.
    pub async fn connect(bind: SocketAddr, peer: SocketAddr) -> Result<Self, LinkError> {
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(peer).await?;
        log::info!("Infrared link emulated over UDP between {bind} and {peer}.");
        Ok(Self {
            socket,
            received: VecDeque::new(),
        })
    }
}

impl SerialLink for UdpLink {
    fn send(&mut self, byte: u8) {
        if let Err(e) = self.socket.try_send(&[byte]) {
            log::debug!("Byte {byte:#04x} lost on the UDP link : {e}.");
        }
    }

    fn try_receive(&mut self) -> Option<u8> {
        let mut datagram = [0u8; 16];
        while self.received.is_empty() {
            match self.socket.try_recv(&mut datagram) {
                Ok(length) => self.received.extend(&datagram[..length]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    // The peer not listening yet surfaces here, it is not worth more than a lost byte.
                    log::trace!("UDP link receive error : {e}.");
                    break;
                }
            }
        }
        self.received.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[tokio::test]
    async fn bytes_cross_the_link() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let a_socket = UdpSocket::bind(SocketAddr::new(localhost, 0)).await.unwrap();
        let b_socket = UdpSocket::bind(SocketAddr::new(localhost, 0)).await.unwrap();
        let (a_address, b_address) = (a_socket.local_addr().unwrap(), b_socket.local_addr().unwrap());
        drop((a_socket, b_socket));

        let mut a = UdpLink::connect(a_address, b_address).await.unwrap();
        let mut b = UdpLink::connect(b_address, a_address).await.unwrap();
        a.send(0xB3);
        b.socket.readable().await.unwrap();
        assert_eq!(b.try_receive(), Some(0xB3));
        assert_eq!(b.try_receive(), None);
    }
}
