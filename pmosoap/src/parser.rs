//! Décodage des enveloppes SOAP
//!
//! Le document est parcouru comme un flux d'événements XML avec résolution
//! des namespaces. L'en-tête et le corps sont chacun décodés par une petite
//! machine à états ; chaque élément applicatif est extrait tel quel du
//! document puis désérialisé avec `quick_xml::de` dans le type choisi par
//! l'appelant.

use quick_xml::{
    NsReader,
    escape::unescape,
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::trace;

use crate::{Body, DecodeError, Envelope, Fault, Header, SOAP_ENV_NS};

/// Décode une enveloppe complète : en-tête de type `H`, corps de type `B`
pub fn decode<H, B>(xml: &[u8]) -> Result<Envelope<H, B>, DecodeError>
where
    H: DeserializeOwned,
    B: DeserializeOwned,
{
    let (header, body) = EnvelopeParser::new(xml)?.parse(HeaderMode::Decode)?;
    Ok(Envelope { header, body })
}

/// Décode uniquement le corps, l'en-tête éventuel est ignoré
pub fn decode_body<B: DeserializeOwned>(xml: &[u8]) -> Result<Body<B>, DecodeError> {
    let (_, body) = EnvelopeParser::new(xml)?.parse::<IgnoredAny, B>(HeaderMode::Skip)?;
    Ok(body)
}

/// Extrait le Fault d'une réponse, `None` si le corps porte un autre élément
pub fn decode_fault(xml: &[u8]) -> Result<Option<Fault>, DecodeError> {
    match decode_body::<IgnoredAny>(xml)? {
        Body::Fault(fault) => Ok(Some(fault)),
        Body::Content(_) => Ok(None),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HeaderMode {
    Decode,
    Skip,
}

enum HeaderState<H> {
    AwaitingChild,
    Decoded(H),
}

enum BodyState<B> {
    Empty,
    Consumed(Body<B>),
}

/// Élément ou fin d'élément rencontré dans le flux
enum Node<'i> {
    Element {
        start: BytesStart<'i>,
        empty: bool,
        soap: bool,
    },
    End,
    Eof,
}

struct EnvelopeParser<'i> {
    input: &'i str,
    reader: NsReader<&'i [u8]>,
}

impl<'i> EnvelopeParser<'i> {
    fn new(xml: &'i [u8]) -> Result<Self, DecodeError> {
        let input = std::str::from_utf8(xml)?;
        // The reader skips a leading BOM, offsets must match `input`
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Ok(Self {
            input,
            reader: NsReader::from_str(input),
        })
    }

    fn parse<H, B>(mut self, mode: HeaderMode) -> Result<(Option<Header<H>>, Body<B>), DecodeError>
    where
        H: DeserializeOwned,
        B: DeserializeOwned,
    {
        match self.next_node()? {
            Node::Element { start, soap, empty } if soap && is(&start, b"Envelope") => {
                if empty {
                    return Err(DecodeError::MissingBody);
                }
            }
            Node::Element { start, .. } => return Err(DecodeError::NotAnEnvelope(name(&start))),
            Node::End | Node::Eof => return Err(DecodeError::UnexpectedEof),
        }

        let mut header = None;
        let mut body = None;

        loop {
            match self.next_node()? {
                Node::Element { start, empty, soap } if soap && is(&start, b"Header") => {
                    if empty {
                        continue;
                    }
                    match mode {
                        HeaderMode::Decode => header = self.header()?,
                        HeaderMode::Skip => self.skip(&start)?,
                    }
                }
                Node::Element { start, empty, soap } if soap && is(&start, b"Body") => {
                    if body.is_some() {
                        return Err(DecodeError::DuplicateBody);
                    }
                    if empty {
                        return Err(DecodeError::EmptyBody);
                    }
                    body = Some(self.body()?);
                }
                Node::Element { start, empty, .. } => {
                    trace!(element = %name(&start), "Skipping unknown envelope child");
                    if !empty {
                        self.skip(&start)?;
                    }
                }
                Node::End => break,
                Node::Eof => return Err(DecodeError::UnexpectedEof),
            }
        }

        let body = body.ok_or(DecodeError::MissingBody)?;
        Ok((header, body))
    }

    /// En-tête : au plus un élément enfant
    fn header<H: DeserializeOwned>(&mut self) -> Result<Option<Header<H>>, DecodeError> {
        let mut state = HeaderState::AwaitingChild;

        loop {
            match self.next_node()? {
                Node::Element { start, empty, .. } => {
                    if let HeaderState::Decoded(_) = state {
                        return Err(DecodeError::MultipleHeaderElements);
                    }
                    state = HeaderState::Decoded(self.decode_element(&start, empty)?);
                }
                Node::End => {
                    return Ok(match state {
                        HeaderState::AwaitingChild => None,
                        HeaderState::Decoded(content) => Some(Header::new(content)),
                    });
                }
                Node::Eof => return Err(DecodeError::UnexpectedEof),
            }
        }
    }

    /// Corps : exactement un élément, contenu applicatif ou Fault
    fn body<B: DeserializeOwned>(&mut self) -> Result<Body<B>, DecodeError> {
        let mut state = BodyState::Empty;

        loop {
            match self.next_node()? {
                Node::Element { start, empty, soap } => {
                    if let BodyState::Consumed(_) = state {
                        return Err(DecodeError::MultipleBodyElements);
                    }
                    let body = if soap && is(&start, b"Fault") {
                        Body::Fault(self.fault(empty)?)
                    } else {
                        Body::Content(self.decode_element(&start, empty)?)
                    };
                    state = BodyState::Consumed(body);
                }
                Node::End => {
                    return match state {
                        BodyState::Empty => Err(DecodeError::EmptyBody),
                        BodyState::Consumed(body) => Ok(body),
                    };
                }
                Node::Eof => return Err(DecodeError::UnexpectedEof),
            }
        }
    }

    fn fault(&mut self, empty: bool) -> Result<Fault, DecodeError> {
        let mut fault = Fault::default();
        if empty {
            return Ok(fault);
        }

        loop {
            match self.next_node()? {
                Node::Element { start, empty, .. } => {
                    let value = if empty { String::new() } else { self.text()? };
                    match start.local_name().as_ref() {
                        b"faultcode" => fault.fault_code = Some(value),
                        b"faultstring" => fault.fault_string = Some(value),
                        b"faultactor" => fault.fault_actor = Some(value),
                        b"detail" => fault.detail = Some(value),
                        _ => trace!(element = %name(&start), "Ignoring unknown fault child"),
                    }
                }
                Node::End => return Ok(fault),
                Node::Eof => return Err(DecodeError::UnexpectedEof),
            }
        }
    }

    /// Texte direct d'un élément, les éléments imbriqués sont sautés
    fn text(&mut self) -> Result<String, DecodeError> {
        let mut text = String::new();
        let mut depth = 0usize;

        loop {
            match self.reader.read_event()? {
                Event::Text(e) if depth == 0 => {
                    text.push_str(&unescape(&String::from_utf8_lossy(&e))?);
                }
                Event::CData(e) if depth == 0 => text.push_str(&String::from_utf8_lossy(&e)),
                Event::GeneralRef(e) if depth == 0 => {
                    let reference = format!("&{};", String::from_utf8_lossy(&e));
                    text.push_str(&unescape(&reference)?);
                }
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(text),
                Event::End(_) => depth -= 1,
                Event::Eof => return Err(DecodeError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// Désérialise l'élément courant dans le type de l'appelant
    fn decode_element<T: DeserializeOwned>(
        &mut self,
        start: &BytesStart<'i>,
        empty: bool,
    ) -> Result<T, DecodeError> {
        let source = self.element_source(start, empty)?;
        quick_xml::de::from_str(source).map_err(|source| DecodeError::Content {
            element: name(start),
            source,
        })
    }

    /// Texte source de l'élément dont la balise ouvrante vient d'être lue
    fn element_source(&mut self, start: &BytesStart<'i>, empty: bool) -> Result<&'i str, DecodeError> {
        let tag_end = self.position();
        // Attribute values cannot contain a raw '<'
        let offset = self
            .input
            .get(..tag_end)
            .and_then(|head| head.rfind('<'))
            .ok_or(DecodeError::UnexpectedEof)?;

        if !empty {
            self.reader.read_to_end(start.name())?;
        }

        let end = self.position();
        self.input.get(offset..end).ok_or(DecodeError::UnexpectedEof)
    }

    fn skip(&mut self, start: &BytesStart<'i>) -> Result<(), DecodeError> {
        self.reader.read_to_end(start.name())?;
        Ok(())
    }

    fn next_node(&mut self) -> Result<Node<'i>, DecodeError> {
        loop {
            let (ns, event) = self.reader.read_resolved_event()?;
            let soap = matches!(ns, ResolveResult::Bound(Namespace(ns)) if ns == SOAP_ENV_NS.as_bytes());

            match event {
                Event::Start(start) => {
                    return Ok(Node::Element {
                        start,
                        empty: false,
                        soap,
                    });
                }
                Event::Empty(start) => {
                    return Ok(Node::Element {
                        start,
                        empty: true,
                        soap,
                    });
                }
                Event::End(_) => return Ok(Node::End),
                Event::Eof => return Ok(Node::Eof),
                _ => {}
            }
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }
}

fn is(start: &BytesStart<'_>, local_name: &[u8]) -> bool {
    start.local_name().as_ref() == local_name
}

fn name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}
