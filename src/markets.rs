use crate::tickers::TickerSourceError;

/// Where the dynamic ticker source finds a market's members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexPage {
    pub url: &'static str,
    /// Accepted header names for the symbol column, lowercase.
    pub columns: &'static [&'static str],
    /// A table with fewer symbols than this is not the membership table.
    pub min_rows: usize,
    /// Exchange suffix appended to bare symbols, e.g. `.DE`.
    pub suffix: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Market {
    pub id: &'static str,
    pub name: &'static str,
    pub roster: &'static [&'static str],
    pub index_page: IndexPage,
}

/// Immutable market configuration for one run, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTable {
    markets: Vec<Market>,
}

impl Default for MarketTable {
    fn default() -> Self {
        Self {
            markets: vec![
                Market {
                    id: "sp500",
                    name: "S&P 500 – USA",
                    roster: SP500_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies",
                        columns: &["symbol", "ticker"],
                        min_rows: 50,
                        suffix: None,
                    },
                },
                Market {
                    id: "nasdaq",
                    name: "NASDAQ 100 – Technologie",
                    roster: NASDAQ_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/Nasdaq-100",
                        columns: &["ticker", "symbol"],
                        min_rows: 50,
                        suffix: None,
                    },
                },
                Market {
                    id: "dax",
                    name: "DAX – Deutschland",
                    roster: DAX_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/DAX",
                        columns: &["ticker", "symbol"],
                        min_rows: 20,
                        suffix: Some(".DE"),
                    },
                },
                Market {
                    id: "ftse",
                    name: "FTSE 100 – UK",
                    roster: FTSE_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/FTSE_100_Index",
                        columns: &["ticker", "epic", "symbol"],
                        min_rows: 50,
                        suffix: Some(".L"),
                    },
                },
                Market {
                    id: "cac",
                    name: "CAC 40 – Frankreich",
                    roster: CAC_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/CAC_40",
                        columns: &["ticker", "symbol"],
                        min_rows: 20,
                        suffix: Some(".PA"),
                    },
                },
                Market {
                    id: "nikkei",
                    name: "Nikkei 225 – Japan",
                    roster: NIKKEI_ROSTER,
                    index_page: IndexPage {
                        url: "https://en.wikipedia.org/wiki/Nikkei_225",
                        columns: &["code", "ticker", "symbol"],
                        min_rows: 50,
                        suffix: Some(".T"),
                    },
                },
            ],
        }
    }
}

impl MarketTable {
    pub fn new(markets: Vec<Market>) -> Self {
        Self { markets }
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn get(&self, id: &str) -> Option<&Market> {
        self.markets
            .iter()
            .find(|market| market.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Keeps only the requested ids, preserving table order.
    pub fn restrict_to(&self, ids: &[String]) -> Result<Self, TickerSourceError> {
        if ids.is_empty() {
            return Ok(self.clone());
        }
        for id in ids {
            if self.get(id).is_none() {
                return Err(TickerSourceError::UnknownMarket(id.trim().to_string()));
            }
        }
        let markets = self
            .markets
            .iter()
            .filter(|market| ids.iter().any(|id| market.id.eq_ignore_ascii_case(id.trim())))
            .copied()
            .collect();
        Ok(Self { markets })
    }
}

const SP500_ROSTER: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "GOOG", "BRK-B", "LLY", "AVGO",
    "TSLA", "JPM", "UNH", "XOM", "V", "MA", "COST", "HD", "PG", "JNJ",
    "ABBV", "BAC", "MRK", "CVX", "KO", "WMT", "NFLX", "CRM", "AMD", "PEP",
    "TMO", "ACN", "ORCL", "CSCO", "ABT", "LIN", "MCD", "DHR", "ADBE", "TXN",
    "NKE", "WFC", "NEE", "RTX", "BMY", "T", "MS", "HON", "AMGN", "LOW",
    "QCOM", "UPS", "SBUX", "IBM", "PM", "CAT", "ELV", "DE", "BA", "SPGI",
    "PLD", "GILD", "AXP", "BLK", "SYK", "GE", "MDT", "AMAT", "TJX", "GS",
    "VRTX", "ADI", "ISRG", "CB", "CI", "MMC", "MDLZ", "PGR", "ZTS", "REGN",
    "CVS", "BKNG", "ADP", "LRCX", "CL", "SO", "DUK", "BDX", "AON", "SHW",
    "MO", "BSX", "EQIX", "CME", "ITW", "ETN", "HCA", "ICE", "FI", "NOC",
];

const NASDAQ_ROSTER: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "META", "GOOGL", "GOOG", "AVGO", "TSLA", "COST",
    "NFLX", "AMD", "ADBE", "QCOM", "PEP", "CSCO", "TXN", "AMGN", "HON", "INTU",
    "ISRG", "AMAT", "BKNG", "LRCX", "ADP", "MU", "PANW", "REGN", "VRTX", "KLAC",
    "MELI", "SNPS", "CDNS", "CRWD", "FTNT", "ABNB", "KDP", "MDLZ", "ORLY", "PAYX",
    "CTAS", "FAST", "MNST", "ROST", "PCAR", "IDXX", "BIIB", "ILMN", "DXCM", "ZS",
    "TEAM", "WDAY", "OKTA", "DOCU", "ZM", "SPLK", "DDOG", "SNOW", "NET", "COIN",
    "ROKU", "TTD", "MRNA", "SGEN", "ALGN", "CPRT", "SIRI", "EBAY", "EA", "NXPI",
    "MRVL", "ON", "WBA", "DLTR", "GEHC", "GFS", "CCEP", "TTWO", "ODFL", "VRSK",
    "ANSS", "CTSH", "CDW", "FANG", "EXC", "XTSLA", "AZN", "CMCSA", "PDD", "ASML",
    "TMUS", "PYPL", "INTC", "LCID", "RIVN", "GRAB", "JD", "BIDU", "NTES", "WBD",
];

const DAX_ROSTER: &[&str] = &[
    "SAP.DE", "SIE.DE", "ALV.DE", "MRK.DE", "DTE.DE", "BAYN.DE", "BMW.DE", "MBG.DE", "DBK.DE", "RWE.DE",
    "BAS.DE", "EOAN.DE", "ADS.DE", "VOW3.DE", "HEN3.DE", "FRE.DE", "MTX.DE", "SHL.DE", "ZAL.DE", "IFX.DE",
    "1COV.DE", "HNR1.DE", "DHER.DE", "VNA.DE", "CON.DE", "ENR.DE", "QIA.DE", "SY1.DE", "WAF.DE", "BEI.DE",
    "MAN.DE", "HEI.DE", "EVT.DE", "KGX.DE", "LEG.DE", "GFK.DE", "BOSS.DE", "MDO.DE", "TUI1.DE", "LHA.DE",
    "FME.DE", "ARL.DE", "CEV.DE", "ECV.DE", "S92.DE", "TAG.DE", "SDF.DE", "AIXA.DE", "EVD.DE", "AFX.DE",
    "CWC.DE", "TIMA.DE", "NEM.DE", "PUM.DE", "PSM.DE", "FNTN.DE", "BR3.DE", "XONA.DE", "BC8.DE", "DWNI.DE",
    "HAG.DE", "NDA.DE", "DBAN.DE", "DEQ.DE", "MVV1.DE", "RAA.DE", "GXI.DE", "NOEJ.DE", "OSR.DE", "WUW.DE",
    "EMH.DE", "LPKF.DE", "NDX1.DE", "G1A.DE", "DMP.DE", "SDAX.DE", "H9Y.DE", "SZG.DE", "MWNG.DE", "HLAG.DE",
    "UTDI.DE", "PNE.DE", "SBS.DE", "WTTR.DE", "DRW3.DE", "HSX.DE", "KION.DE", "WCHA.DE", "IVU.DE", "4BS.DE",
    "ENL.DE", "SGCG.DE", "TOM.DE", "T3M.DE", "BIO3.DE", "NOEJ.DE", "VBKP.DE", "RHM.DE", "FPE3.DE", "GLJ.DE",
];

const FTSE_ROSTER: &[&str] = &[
    "SHEL.L", "AZN.L", "HSBA.L", "ULVR.L", "BP.L", "RIO.L", "GSK.L", "REL.L", "BATS.L", "DGE.L",
    "NG.L", "NWG.L", "LLOY.L", "LSEG.L", "VOD.L", "GLEN.L", "PRU.L", "EXPN.L", "RKT.L", "WPP.L",
    "CPG.L", "SPX.L", "MNDI.L", "INF.L", "STJ.L", "BA.L", "BT.L", "IHG.L", "OCDO.L", "SGRO.L",
    "AAL.L", "AUTO.L", "BNZL.L", "CCH.L", "CNA.L", "CRDA.L", "FLTR.L", "HLN.L", "III.L", "IMB.L",
    "ITV.L", "JD.L", "JMAT.L", "KGF.L", "LAND.L", "LGEN.L", "MKS.L", "MONY.L", "MRO.L", "MTO.L",
    "NXT.L", "PHNX.L", "PSH.L", "PSON.L", "RMV.L", "RR.L", "SBRY.L", "SDR.L", "SKG.L", "SMDS.L",
    "SMIN.L", "SMT.L", "SN.L", "SVT.L", "TSCO.L", "TW.L", "WEIR.L", "WTB.L", "ABF.L", "ADM.L",
    "AHT.L", "ANTO.L", "AVV.L", "BKG.L", "BME.L", "BRBY.L", "BWY.L", "CCL.L", "DCC.L", "DLN.L",
    "EZJ.L", "FCIT.L", "FRES.L", "GAW.L", "GNRC.L", "HIK.L", "HMN.L", "HOC.L", "HSV.L", "IAG.L",
    "ICG.L", "IPO.L", "JE.L", "KIE.L", "MCRO.L", "MGNS.L", "MSLH.L", "OML.L", "OPHR.L", "PCG.L",
];

const CAC_ROSTER: &[&str] = &[
    "MC.PA", "OR.PA", "TTE.PA", "SAN.PA", "AI.PA", "BNP.PA", "SU.PA", "AIR.PA", "RI.PA", "RMS.PA",
    "EL.PA", "DG.PA", "ACA.PA", "SGO.PA", "CS.PA", "KER.PA", "CAP.PA", "GLE.PA", "LR.PA", "VIE.PA",
    "SAF.PA", "HO.PA", "STLAM.MI", "WLN.PA", "DSY.PA", "ORA.PA", "STM.PA", "EN.PA", "ENGI.PA", "MT.AS",
    "STLA.PA", "AF.PA", "ALO.PA", "ATO.PA", "BEN.PA", "BOL.PA", "CA.PA", "CI.PA", "COFA.PA", "CRH.PA",
    "DBG.PA", "EDEN.PA", "ERF.PA", "EDF.PA", "ELIS.PA", "ETL.PA", "EUCAR.PA", "FDR.PA", "FTI.PA", "GTT.PA",
    "HAVAS.PA", "HO.PA", "IDP.PA", "IFNL.PA", "INVE.PA", "IPH.PA", "ISS.PA", "JCAUX.PA", "KEY.PA", "LACR.PA",
    "LANC.PA", "LDC.PA", "LI.PA", "LNA.PA", "LOUP.PA", "LPE.PA", "LR.PA", "LU.PA", "LUXA.PA", "LVMH.PA",
    "MAAT.PA", "MAU.PA", "MEDCL.PA", "MERY.PA", "MF.PA", "MLGF.PA", "MRN.PA", "NREX.PA", "NSN.PA", "NXI.PA",
    "OPT.PA", "OSE.PA", "PHA.PA", "POM.PA", "PTON.PA", "QDT.PA", "RBAL.PA", "ROAI.PA", "RXL.PA", "SAC.PA",
    "SCBSM.PA", "SES.PA", "SFT.PA", "SFOR.PA", "SLB.PA", "SOP.PA", "SPEL.PA", "SRP.PA", "STF.PA", "TKT.PA",
];

const NIKKEI_ROSTER: &[&str] = &[
    "7203.T", "9984.T", "6758.T", "8306.T", "8316.T", "7267.T", "6861.T", "7974.T", "9433.T", "8411.T",
    "6098.T", "4568.T", "7751.T", "9432.T", "8058.T", "7741.T", "6367.T", "4519.T", "8031.T", "9022.T",
    "6954.T", "4661.T", "7269.T", "8035.T", "6501.T", "4543.T", "5108.T", "2914.T", "6902.T", "7832.T",
    "4502.T", "8802.T", "6702.T", "4901.T", "9020.T", "5401.T", "1925.T", "6503.T", "8766.T", "7011.T",
    "9021.T", "4307.T", "8604.T", "9064.T", "6645.T", "9008.T", "4452.T", "6857.T", "3382.T", "9007.T",
    "8001.T", "9101.T", "8801.T", "6326.T", "5020.T", "1928.T", "7270.T", "7201.T", "6471.T", "1803.T",
    "4004.T", "9009.T", "8309.T", "4063.T", "7733.T", "2501.T", "3407.T", "6981.T", "4911.T", "8750.T",
    "5711.T", "3436.T", "5233.T", "7735.T", "8830.T", "6752.T", "5332.T", "7912.T", "1605.T", "3289.T",
    "4324.T", "6988.T", "6770.T", "7762.T", "4005.T", "3105.T", "1332.T", "4042.T", "3863.T", "5706.T",
    "1812.T", "8015.T", "5012.T", "4151.T", "5703.T", "3401.T", "4183.T", "6302.T", "5631.T", "8267.T",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_six_markets_in_output_order() {
        let table = MarketTable::default();
        let ids: Vec<&str> = table.markets().iter().map(|market| market.id).collect();
        assert_eq!(ids, vec!["sp500", "nasdaq", "dax", "ftse", "cac", "nikkei"]);
        for market in table.markets() {
            assert_eq!(market.roster.len(), 100, "{} roster size", market.id);
        }
    }

    #[test]
    fn restrict_keeps_table_order() {
        let table = MarketTable::default();
        let restricted = table
            .restrict_to(&["nikkei".to_string(), "DAX".to_string()])
            .unwrap();
        let ids: Vec<&str> = restricted.markets().iter().map(|market| market.id).collect();
        assert_eq!(ids, vec!["dax", "nikkei"]);
    }

    #[test]
    fn restrict_rejects_unknown_ids() {
        let err = MarketTable::default()
            .restrict_to(&["tsx".to_string()])
            .unwrap_err();
        assert!(matches!(err, TickerSourceError::UnknownMarket(id) if id == "tsx"));
    }
}
