use crate::{
    metadata::{
        signatures::{
            SignatureArray, SignatureField, SignatureLocalVariable, SignatureLocalVariables,
            SignatureMethod, SignatureMethodSpec, SignatureParameter, SignatureProperty,
            SignatureTypeSpec, TypeSignature,
        },
        signatures::types::ArrayDimension,
        token::Token,
        typesystem::ELEMENT_TYPE,
    },
    Parser, Result,
};

/// Maximum recursion depth for signature parsing
const MAX_RECURSION_DEPTH: usize = 50;

/// Signature parser that handles all signature kinds in ECMA-335.
///
/// Signatures are blobs: the caller looks the blob up by index, then hands the
/// bytes to one of the `parse_*` entry points. Every decoder consumes exactly
/// the bytes of its signature; trailing garbage is the caller's to detect via
/// the blob length.
///
/// # Example
///
/// ```rust
/// use pescope::metadata::signatures::SignatureParser;
/// let data = &[0x20, 0x01, 0x01, 0x0E];
/// let mut parser = SignatureParser::new(data);
/// let sig = parser.parse_method_signature().unwrap();
/// assert_eq!(sig.params.len(), 1);
/// ```
///
/// ## Notes:
/// - Besides ECMA-335, it's also worth looking at <https://github.com/dotnet/runtime/blob/main/docs/design/coreclr/profiling/davbr-blog-archive/samples/sigparse.cpp>
/// - Do not re-use a parser instance for multiple signatures.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Create a new `SignatureParser` from a byte slice
    ///
    /// ## Arguments
    /// * 'data' - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
        }
    }

    /// Amount of bytes consumed so far
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.parser.pos()
    }

    /// Parse a single type from the signature blob
    fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(malformed_error!(
                "Signature nesting exceeds the recursion limit of {}",
                MAX_RECURSION_DEPTH
            ));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(
                self.parse_custom_mods()?,
                Box::new(self.parse_type()?),
            )),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_compressed_token()?,
            )),
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parser.read_compressed_token()?)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let elem_type = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                let mut dimensions: Vec<ArrayDimension> = Vec::with_capacity(num_sizes as usize);
                for _ in 0..num_sizes {
                    dimensions.push(ArrayDimension {
                        size: Some(self.parser.read_compressed_uint()?),
                        lower_bound: None,
                    });
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                for i in 0..num_lo_bounds {
                    let lower_bound = self.parser.read_compressed_uint()?;
                    if let Some(dimension) = dimensions.get_mut(i as usize) {
                        dimension.lower_bound = Some(lower_bound);
                    }
                }

                Ok(TypeSignature::Array(SignatureArray {
                    base: Box::new(elem_type),
                    rank,
                    dimensions,
                }))
            }
            ELEMENT_TYPE::GENERICINST => {
                let peek_byte = self.parser.peek_byte()?;
                if peek_byte != ELEMENT_TYPE::CLASS && peek_byte != ELEMENT_TYPE::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST - Next byte is not CLASS or VALUETYPE - {}",
                        peek_byte
                    ));
                }

                let base_type = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;

                let mut type_args = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    type_args.push(self.parse_type()?);
                }

                Ok(TypeSignature::GenericInst(Box::new(base_type), type_args))
            }
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(
                self.parse_custom_mods()?,
                Box::new(self.parse_type()?),
            )),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::CMOD_REQD => {
                Ok(TypeSignature::ModifiedRequired(self.parse_custom_mods()?))
            }
            ELEMENT_TYPE::CMOD_OPT => {
                Ok(TypeSignature::ModifiedOptional(self.parse_custom_mods()?))
            }
            ELEMENT_TYPE::INTERNAL => Ok(TypeSignature::Internal),
            ELEMENT_TYPE::SENTINEL => Ok(TypeSignature::Sentinel),
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {}",
                current_byte
            )),
        }
    }

    /// Parse custom modifiers (`CMOD_OPT` or `CMOD_REQD`)
    fn parse_custom_mods(&mut self) -> Result<Vec<Token>> {
        let mut mods = Vec::new();

        while self.parser.has_more_data() {
            let next_byte = self.parser.peek_byte()?;
            if next_byte != ELEMENT_TYPE::CMOD_OPT && next_byte != ELEMENT_TYPE::CMOD_REQD {
                break;
            }

            self.parser.advance()?;

            mods.push(self.parser.read_compressed_token()?);
        }

        Ok(mods)
    }

    /// Parse a parameter including custom modifiers (the return type counts as parameter)
    fn parse_param(&mut self) -> Result<SignatureParameter> {
        let custom_mods = self.parse_custom_mods()?;

        let mut by_ref = false;
        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.advance()?;
            by_ref = true;
        }

        Ok(SignatureParameter {
            modifiers: custom_mods,
            by_ref,
            base: self.parse_type()?,
        })
    }

    /// Parse a method signature from the blob - `MethodDefSig`, `MethodRefSig`, `StandAloneMethodSig`
    ///
    /// # Errors
    /// Returns an error if the signature data is malformed or reading runs past the buffer.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let convention_byte = self.parser.read_le::<u8>()?;

        let mut method = SignatureMethod {
            has_this: convention_byte & 0x20 != 0,
            explicit_this: convention_byte & 0x40 != 0,
            default: convention_byte & 0x0F == 0,
            vararg: convention_byte & 0x0F == 0x5,
            cdecl: convention_byte & 0x0F == 0x1,
            stdcall: convention_byte & 0x0F == 0x2,
            thiscall: convention_byte & 0x0F == 0x3,
            fastcall: convention_byte & 0x0F == 0x4,
            param_count_generic: if convention_byte & 0x10 != 0 {
                self.parser.read_compressed_uint()?
            } else {
                0
            },
            param_count: self.parser.read_compressed_uint()?,
            return_type: self.parse_param()?,
            params: Vec::new(),
            varargs: Vec::new(),
        };

        for _ in 0..method.param_count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                // Param list is over, the rest is the vararg param list
                self.parser.advance()?;
                break;
            }

            method.params.push(self.parse_param()?);
        }

        if method.vararg && method.params.len() < method.param_count as usize {
            for _ in method.params.len()..method.param_count as usize {
                method.varargs.push(self.parse_param()?);
            }
        }

        Ok(method)
    }

    /// Parse a field signature from the blob (II.23.2.4)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or the field type cannot be parsed.
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x06 {
            // 0x06 == FIELD
            return Err(malformed_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        let custom_mods = self.parse_custom_mods()?;
        let type_sig = self.parse_type()?;

        Ok(SignatureField {
            modifiers: custom_mods,
            base: type_sig,
        })
    }

    /// Parse a property signature from the blob (II.23.2.5)
    ///
    /// # Errors
    /// Returns an error if the property signature header is invalid or the property
    /// type cannot be parsed.
    pub fn parse_property_signature(&mut self) -> Result<SignatureProperty> {
        let head_byte = self.parser.read_le::<u8>()?;
        if (head_byte & 0x08) == 0 {
            return Err(malformed_error!(
                "SignatureProperty - invalid start - {}",
                head_byte
            ));
        }

        let has_this = (head_byte & 0x20) != 0;

        let param_count = self.parser.read_compressed_uint()?;
        let custom_mods = self.parse_custom_mods()?;
        let type_sig = self.parse_type()?;

        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            params.push(self.parse_param()?);
        }

        Ok(SignatureProperty {
            has_this,
            modifiers: custom_mods,
            base: type_sig,
            params,
        })
    }

    /// Parse a local variable signature from the blob (II.23.2.6)
    ///
    /// # Errors
    /// Returns an error if the local variable signature header is invalid or variable
    /// types cannot be parsed.
    pub fn parse_local_var_signature(&mut self) -> Result<SignatureLocalVariables> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x07 {
            return Err(malformed_error!(
                "SignatureLocalVar - invalid start - {}",
                head_byte
            ));
        }

        let count = self.parser.read_compressed_uint()?;

        let mut locals = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::TYPEDBYREF {
                locals.push(SignatureLocalVariable {
                    modifiers: Vec::new(),
                    is_byref: false,
                    is_pinned: false,
                    base: TypeSignature::TypedByRef,
                });
                self.parser.advance()?;

                continue;
            }

            let mut custom_mods = Vec::new();
            let mut pinned = false;

            // Constraints and modifiers may interleave: custom_mod -> constraint -> custom_mod -> ...
            while self.parser.has_more_data() {
                match self.parser.peek_byte()? {
                    ELEMENT_TYPE::CMOD_OPT | ELEMENT_TYPE::CMOD_REQD => {
                        self.parser.advance()?;
                        custom_mods.push(self.parser.read_compressed_token()?);
                    }
                    ELEMENT_TYPE::PINNED => {
                        self.parser.advance()?;
                        pinned = true;
                    }
                    _ => break,
                }
            }

            let mut is_byref = false;
            if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
                self.parser.advance()?;
                is_byref = true;
            }

            locals.push(SignatureLocalVariable {
                modifiers: custom_mods,
                is_byref,
                is_pinned: pinned,
                base: self.parse_type()?,
            });
        }

        Ok(SignatureLocalVariables { locals })
    }

    /// Parse a type specification signature from the blob (II.23.2.14)
    ///
    /// # Errors
    /// Returns an error if the specified type cannot be parsed.
    pub fn parse_type_spec_signature(&mut self) -> Result<SignatureTypeSpec> {
        Ok(SignatureTypeSpec {
            base: self.parse_type()?,
        })
    }

    /// Parse a generic method instantiation signature from the blob (II.23.2.15)
    ///
    /// # Errors
    /// Returns an error if the signature header is invalid or an argument type
    /// cannot be parsed.
    pub fn parse_method_spec_signature(&mut self) -> Result<SignatureMethodSpec> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x0A {
            // 0x0A == GENRICINST calling convention
            return Err(malformed_error!(
                "SignatureMethodSpec - invalid start - {}",
                head_byte
            ));
        }

        let arg_count = self.parser.read_compressed_uint()?;
        let mut generic_args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            generic_args.push(self.parse_type()?);
        }

        Ok(SignatureMethodSpec { generic_args })
    }
}
